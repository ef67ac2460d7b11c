//! Scripted in-memory judge used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{JudgeClient, SubmissionDetails, SubmissionHandle, SubmissionStatus};
use crate::error::{EngineError, EngineResult};

/// Behaviour of one submission, consumed in `create_submission` order
#[derive(Debug, Clone)]
pub struct Scripted {
    /// Number of status polls before the job reports finished, `None` for never
    finish_after: Option<usize>,
    status_fails: bool,
    details: SubmissionDetails,
}

impl Scripted {
    pub fn finished_after(polls: usize, result_code: i64, stdout: &str) -> Self {
        Self {
            finish_after: Some(polls),
            status_fails: false,
            details: SubmissionDetails {
                result_code,
                stdout: stdout.to_string(),
                cpu_time_ms: 10,
                memory_kb: 1024,
                ..Default::default()
            },
        }
    }

    pub fn accepted(stdout: &str) -> Self {
        Self::finished_after(1, 15, stdout)
    }

    pub fn compile_error(info: &str) -> Self {
        let mut scripted = Self::finished_after(1, 11, "partial");
        scripted.details.compile_info = info.to_string();
        scripted
    }

    pub fn never_finishes() -> Self {
        Self::never_finishes_with(15, "")
    }

    pub fn never_finishes_with(result_code: i64, stdout: &str) -> Self {
        Self {
            finish_after: None,
            ..Self::finished_after(0, result_code, stdout)
        }
    }

    /// Every status query fails with a transport error
    pub fn unreachable() -> Self {
        Self {
            status_fails: true,
            ..Self::never_finishes()
        }
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.details.stderr = stderr.to_string();
        self
    }

    pub fn with_time(mut self, cpu_time_ms: u64) -> Self {
        self.details.cpu_time_ms = cpu_time_ms;
        self
    }
}

struct Job {
    script: Scripted,
    polls: usize,
}

pub struct FakeJudge {
    script: Mutex<VecDeque<Scripted>>,
    jobs: Mutex<HashMap<SubmissionHandle, Job>>,
    stdins: Mutex<Vec<String>>,
    creates: AtomicUsize,
    statuses: AtomicUsize,
    details: AtomicUsize,
}

impl FakeJudge {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            jobs: Mutex::new(HashMap::new()),
            stdins: Mutex::new(Vec::new()),
            creates: AtomicUsize::new(0),
            statuses: AtomicUsize::new(0),
            details: AtomicUsize::new(0),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.statuses.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details.load(Ordering::SeqCst)
    }

    /// Stdin of every dispatched submission, in dispatch order
    pub fn stdins(&self) -> Vec<String> {
        self.stdins.lock().clone()
    }
}

#[async_trait]
impl JudgeClient for FakeJudge {
    async fn create_submission(
        &self,
        _source_code: &str,
        _language_id: u32,
        stdin: &str,
    ) -> EngineResult<SubmissionHandle> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        let script = self
            .script
            .lock()
            .pop_front()
            .ok_or_else(|| EngineError::transport("no scripted submission left"))?;

        let handle = SubmissionHandle::new(format!("job-{n}"));
        self.stdins.lock().push(stdin.to_string());
        self.jobs
            .lock()
            .insert(handle.clone(), Job { script, polls: 0 });
        Ok(handle)
    }

    async fn get_status(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionStatus> {
        self.statuses.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.jobs.lock();
        let job = jobs
            .get_mut(handle)
            .ok_or_else(|| EngineError::transport("unknown submission"))?;
        job.polls += 1;
        if job.script.status_fails {
            return Err(EngineError::transport("judge unreachable"));
        }

        let finished = job.script.finish_after.is_some_and(|n| job.polls >= n);
        Ok(if finished {
            SubmissionStatus::from_wire(job.script.details.result_code)
        } else {
            SubmissionStatus::from_wire(0)
        })
    }

    async fn get_details(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionDetails> {
        self.details.fetch_add(1, Ordering::SeqCst);
        self.jobs
            .lock()
            .get(handle)
            .map(|job| job.script.details.clone())
            .ok_or_else(|| EngineError::transport("unknown submission"))
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::classify::ExecutionStatus;
use crate::error::{EngineError, EngineResult};
use crate::history::HistoryRecord;
use crate::runner::{ExecutionResult, Runner};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JudgeStatus {
    Accepted,
    WrongAnswer,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    InternalError,
}

impl JudgeStatus {
    /// Verdict for a run that did not succeed; `None` for a successful run
    fn from_failed_run(status: ExecutionStatus) -> Option<Self> {
        match status {
            ExecutionStatus::Success => None,
            ExecutionStatus::CompileError => Some(Self::CompileError),
            ExecutionStatus::RuntimeError => Some(Self::RuntimeError),
            ExecutionStatus::Timeout => Some(Self::TimeLimitExceeded),
            ExecutionStatus::MemoryLimit => Some(Self::MemoryLimitExceeded),
            ExecutionStatus::InternalError => Some(Self::InternalError),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong answer",
            Self::CompileError => "Compilation error",
            Self::RuntimeError => "Runtime error",
            Self::TimeLimitExceeded => "Time limit exceeded",
            Self::MemoryLimitExceeded => "Memory limit exceeded",
            Self::InternalError => "Internal error",
        }
    }
}

/// Diagnostics of one executed test case
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestCaseReport {
    pub index: usize,
    pub description: String,
    pub passed: bool,
    pub status: ExecutionStatus,
    pub expected_output: String,
    pub actual_output: String,
    pub error_text: String,
    pub execution_time_ms: u64,
    pub memory_used_kb: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub status: JudgeStatus,
    pub message: String,
    pub passed_tests: usize,
    pub total_tests: usize,
    pub per_test_results: Vec<TestCaseReport>,
    /// Sum over executed test cases
    pub aggregate_time_ms: u64,
    pub peak_memory_kb: u64,
    pub language: String,
    /// Failures of the post-acceptance side effects; they never change `status`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub side_effect_errors: Vec<String>,
}

/// Identity of whoever submitted a judged solution
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitter {
    pub user_id: u32,
    pub problem_id: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JudgeRequest {
    pub code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
    pub submitter: Option<Submitter>,
}

/// Receiver of accepted solutions
#[async_trait]
pub trait AcceptedSink: Send + Sync {
    async fn persist_solution(
        &self,
        submitter: &Submitter,
        source_code: &str,
        verdict: &JudgeVerdict,
    ) -> anyhow::Result<()>;

    async fn update_statistics(
        &self,
        submitter: &Submitter,
        verdict: &JudgeVerdict,
    ) -> anyhow::Result<()>;
}

/// Judges a solution against test cases, sequentially and fail-fast.
pub struct Judge {
    runner: Arc<Runner>,
    sink: Option<Arc<dyn AcceptedSink>>,
}

impl Judge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self { runner, sink: None }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AcceptedSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    pub async fn judge(
        &self,
        request: &JudgeRequest,
        token: &CancellationToken,
    ) -> EngineResult<JudgeVerdict> {
        if request.test_cases.is_empty() {
            return Err(EngineError::NoTestCases);
        }
        self.runner.resolve_language(&request.language)?;

        let watcher = self.runner.watcher_config();
        let sweep_deadline = Instant::now() + watcher.judge_timeout();
        let total_tests = request.test_cases.len();

        let mut reports = Vec::with_capacity(total_tests);
        let mut passed_tests = 0;
        let mut failure = None;

        for (index, case) in request.test_cases.iter().enumerate() {
            if token.is_cancelled() {
                log::info!("Judging cancelled before test case {}", index + 1);
                return Err(EngineError::Cancelled);
            }

            let remaining = sweep_deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("Judging deadline exhausted before test case {}", index + 1);
                failure = Some((JudgeStatus::TimeLimitExceeded, index));
                break;
            }

            let result = self
                .runner
                .execute(
                    &request.code,
                    &request.language,
                    &case.input,
                    watcher.run_timeout().min(remaining),
                    token,
                )
                .await?;

            let outcome = JudgeStatus::from_failed_run(result.status).or_else(|| {
                (result.output.trim() != case.expected_output.trim())
                    .then_some(JudgeStatus::WrongAnswer)
            });
            reports.push(report(index, case, &result, outcome.is_none()));

            match outcome {
                None => passed_tests += 1,
                Some(status) => {
                    log::info!("Test case {} failed: {status:?}", index + 1);
                    failure = Some((status, index));
                    break;
                }
            }
        }

        let (status, message) = match failure {
            None => (
                JudgeStatus::Accepted,
                format!("All {total_tests} test cases passed"),
            ),
            Some((status, index)) => (
                status,
                format!("{} on test case {}", status.describe(), index + 1),
            ),
        };

        let mut verdict = JudgeVerdict {
            status,
            message,
            passed_tests,
            total_tests,
            aggregate_time_ms: reports.iter().map(|r| r.execution_time_ms).sum(),
            peak_memory_kb: reports.iter().map(|r| r.memory_used_kb).max().unwrap_or(0),
            per_test_results: reports,
            language: request.language.clone(),
            side_effect_errors: Vec::new(),
        };

        if verdict.status == JudgeStatus::Accepted {
            self.record_acceptance(request, &mut verdict).await;
        }

        self.runner
            .history()
            .push(HistoryRecord::Judge(verdict.clone()));
        Ok(verdict)
    }

    /// Hands an accepted solution to the sink; failures are attached to the verdict
    async fn record_acceptance(&self, request: &JudgeRequest, verdict: &mut JudgeVerdict) {
        let (Some(sink), Some(submitter)) = (&self.sink, &request.submitter) else {
            return;
        };

        if let Err(e) = sink.persist_solution(submitter, &request.code, verdict).await {
            log::error!("Failed to persist accepted solution of user {}: {e}", submitter.user_id);
            verdict
                .side_effect_errors
                .push(format!("failed to persist accepted solution: {e}"));
        }

        if let Err(e) = sink.update_statistics(submitter, verdict).await {
            log::error!("Failed to update statistics of user {}: {e}", submitter.user_id);
            verdict
                .side_effect_errors
                .push(format!("failed to update statistics: {e}"));
        }
    }
}

fn report(
    index: usize,
    case: &TestCase,
    result: &ExecutionResult,
    passed: bool,
) -> TestCaseReport {
    TestCaseReport {
        index,
        description: case.description.clone(),
        passed,
        status: result.status,
        expected_output: case.expected_output.trim().to_string(),
        actual_output: result.output.trim().to_string(),
        error_text: result.error_text.clone(),
        execution_time_ms: result.execution_time_ms,
        memory_used_kb: result.memory_used_kb,
    }
}

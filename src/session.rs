use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cancel::CancellationController;
use crate::error::{EngineError, EngineResult};
use crate::history::HistoryEntry;
use crate::judge::{Judge, JudgeRequest, JudgeVerdict};
use crate::runner::ExecutionResult;

const MAX_SESSIONS: usize = 1024;

/// Interactive runner: at most one run or judging sweep in flight at a time.
pub struct Session {
    judge: Arc<Judge>,
    in_flight: Mutex<Option<CancellationController>>,
}

/// Clears the in-flight slot when the operation ends, however it ends
struct InFlight<'a> {
    session: &'a Session,
    controller: CancellationController,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.session.in_flight.lock() = None;
    }
}

impl Session {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self {
            judge,
            in_flight: Mutex::new(None),
        }
    }

    fn begin(&self) -> EngineResult<InFlight<'_>> {
        let mut slot = self.in_flight.lock();
        if slot.is_some() {
            return Err(EngineError::Busy);
        }

        let controller = CancellationController::new();
        *slot = Some(controller.clone());
        Ok(InFlight {
            session: self,
            controller,
        })
    }

    pub async fn run(
        &self,
        code: &str,
        language: &str,
        stdin: Option<&str>,
    ) -> EngineResult<ExecutionResult> {
        let guard = self.begin()?;
        self.judge
            .runner()
            .run(code, language, stdin.unwrap_or_default(), guard.controller.token())
            .await
    }

    pub async fn judge(&self, request: &JudgeRequest) -> EngineResult<JudgeVerdict> {
        let guard = self.begin()?;
        self.judge.judge(request, guard.controller.token()).await
    }

    /// Cancels the in-flight operation, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match self.in_flight.lock().as_ref() {
            Some(controller) => {
                controller.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.judge.runner().history().list()
    }

    pub fn clear_history(&self) {
        self.judge.runner().history().clear();
    }
}

/// Sessions of the HTTP surface, keyed by caller-chosen id
pub struct SessionRegistry {
    judge: Arc<Judge>,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self {
            judge,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(id) {
            return session.clone();
        }

        if sessions.len() >= MAX_SESSIONS {
            // a session still referenced elsewhere may be about to start an operation
            sessions.retain(|_, s| Arc::strong_count(s) > 1 || s.is_busy());
            log::debug!("Pruned idle sessions, {} left", sessions.len());
        }

        let session = Arc::new(Session::new(self.judge.clone()));
        sessions.insert(id.to_string(), session.clone());
        session
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Caller-side handle to abort an in-flight run or judging sweep.
///
/// Cancelling only stops the local orchestration from awaiting the remote job; the
/// judge may keep executing it.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; returns whether this call was the one that cancelled
    pub fn cancel(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{JudgeClient, SubmissionDetails, SubmissionHandle, SubmissionStatus};
use crate::error::EngineResult;
use crate::push::PushChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Awaiting,
    Completed,
    TimedOut,
    Cancelled,
    /// The judge could not be reached while awaiting
    Failed,
}

#[derive(Debug)]
pub enum WatchOutcome {
    Completed(SubmissionDetails),
    TimedOut,
    Cancelled,
}

/// Which mechanism first saw the submission finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observer {
    Push,
    Poll,
}

/// Detects completion of one submission by racing the push channel against a poll loop,
/// bounded by a wall-clock deadline and an external cancellation signal.
pub struct CompletionWatcher {
    client: Arc<dyn JudgeClient>,
    push: Option<Arc<dyn PushChannel>>,
    poll_interval: Duration,
    state: WatchState,
    latest: Mutex<Option<SubmissionStatus>>,
}

impl CompletionWatcher {
    pub fn new(
        client: Arc<dyn JudgeClient>,
        push: Option<Arc<dyn PushChannel>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            push,
            poll_interval,
            state: WatchState::Idle,
            latest: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Latest status observed, never older than a previously observed one
    pub fn latest_status(&self) -> Option<SubmissionStatus> {
        *self.latest.lock()
    }

    /// Waits for `handle` to finish and fetches its details exactly once.
    ///
    /// Losing mechanisms are dropped as soon as the race resolves, so no poll or
    /// subscription outlives this call.
    pub async fn watch(
        &mut self,
        handle: &SubmissionHandle,
        timeout: Duration,
        token: &CancellationToken,
    ) -> EngineResult<WatchOutcome> {
        self.state = WatchState::Awaiting;
        let deadline = tokio::time::sleep(timeout);

        let raced = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            _ = deadline => Some(None),
            finished = self.await_finished(handle) => Some(Some(finished)),
        };

        let observer = match raced {
            None => {
                log::info!("Watch of submission {handle} cancelled");
                self.state = WatchState::Cancelled;
                return Ok(WatchOutcome::Cancelled);
            }
            Some(None) => {
                log::warn!("Submission {handle} did not finish within {timeout:?}");
                self.state = WatchState::TimedOut;
                return Ok(WatchOutcome::TimedOut);
            }
            Some(Some(Err(e))) => {
                self.state = WatchState::Failed;
                return Err(e);
            }
            Some(Some(Ok(observer))) => observer,
        };

        log::debug!("Submission {handle} finished, observed by {observer:?}");

        let details = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            details = self.client.get_details(handle) => Some(details),
        };

        match details {
            None => {
                self.state = WatchState::Cancelled;
                Ok(WatchOutcome::Cancelled)
            }
            Some(Err(e)) => {
                self.state = WatchState::Failed;
                Err(e)
            }
            Some(Ok(details)) => {
                self.state = WatchState::Completed;
                Ok(WatchOutcome::Completed(details))
            }
        }
    }

    async fn await_finished(&self, handle: &SubmissionHandle) -> EngineResult<Observer> {
        tokio::select! {
            _ = self.wait_for_push(handle) => Ok(Observer::Push),
            polled = self.poll_until_finished(handle) => polled.map(|_| Observer::Poll),
        }
    }

    /// Resolves only when the push channel reports a finished status.
    /// An unavailable or silent channel simply never resolves.
    async fn wait_for_push(&self, handle: &SubmissionHandle) {
        let Some(push) = &self.push else {
            return std::future::pending().await;
        };

        let mut subscription = match push.subscribe(handle).await {
            Ok(subscription) => subscription,
            Err(e) => {
                log::warn!("Push channel unavailable for {handle}, polling only: {e}");
                return std::future::pending().await;
            }
        };

        while let Some(message) = subscription.recv().await {
            if self.observe(SubmissionStatus::from_wire(message.status)) {
                return;
            }
        }

        log::debug!("Push channel for {handle} closed, polling only");
        std::future::pending().await
    }

    async fn poll_until_finished(&self, handle: &SubmissionHandle) -> EngineResult<()> {
        let mut interval =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let status = self.client.get_status(handle).await?;
            if self.observe(status) {
                return Ok(());
            }
        }
    }

    /// Records a status reading and reports whether the submission has finished.
    /// Readings older than what was already seen are ignored.
    fn observe(&self, status: SubmissionStatus) -> bool {
        let mut latest = self.latest.lock();
        match *latest {
            Some(seen) if seen.state > status.state => {
                log::debug!("Ignoring stale status {:?} after {:?}", status.state, seen.state);
            }
            _ => *latest = Some(status),
        }
        latest.is_some_and(|s| s.is_finished())
    }
}

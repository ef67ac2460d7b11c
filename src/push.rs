use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::client::SubmissionHandle;
use crate::error::EngineResult;

/// Message delivered by the push channel for one submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PushMessage {
    /// Same encoding as the remote status word
    pub status: i64,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Best-effort real-time notifications keyed by submission.
///
/// Silence is not an error: consumers must keep a polling fallback.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, handle: &SubmissionHandle) -> EngineResult<Subscription>;
}

/// Live subscription; unsubscribes when dropped
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<PushMessage>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<PushMessage>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// Next message, or `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_drop.take() {
            unsubscribe();
        }
    }
}

type SubscriberMap = HashMap<SubmissionHandle, Vec<(u64, mpsc::UnboundedSender<PushMessage>)>>;

/// In-process push channel fed by judge webhooks
#[derive(Default)]
pub struct NotificationHub {
    subscribers: Arc<Mutex<SubscriberMap>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fans a message out to the live subscribers of `handle`.
    /// Returns how many received it.
    pub fn publish(&self, handle: &SubmissionHandle, message: PushMessage) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(senders) = subscribers.get_mut(handle) else {
            log::debug!("Dropping push message for {handle}: no subscribers");
            return 0;
        };

        senders.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subscribers.remove(handle);
        }

        delivered
    }

    pub fn subscriber_count(&self, handle: &SubmissionHandle) -> usize {
        self.subscribers
            .lock()
            .get(handle)
            .map_or(0, |senders| senders.len())
    }
}

#[async_trait]
impl PushChannel for NotificationHub {
    async fn subscribe(&self, handle: &SubmissionHandle) -> EngineResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .lock()
            .entry(handle.clone())
            .or_default()
            .push((id, tx));

        let subscribers = Arc::downgrade(&self.subscribers);
        let handle = handle.clone();
        Ok(Subscription::new(rx, move || {
            let Some(subscribers) = subscribers.upgrade() else {
                return;
            };
            let mut subscribers = subscribers.lock();
            if let Some(senders) = subscribers.get_mut(&handle) {
                senders.retain(|(sid, _)| *sid != id);
                if senders.is_empty() {
                    subscribers.remove(&handle);
                }
            }
        }))
    }
}

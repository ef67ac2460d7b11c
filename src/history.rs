use std::collections::VecDeque;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::create_timestamp;
use crate::judge::JudgeVerdict;
use crate::runner::ExecutionResult;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryRecord {
    Run(ExecutionResult),
    Judge(JudgeVerdict),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub recorded_at: String,
    pub record: HistoryRecord,
}

/// Bounded in-memory ledger of recent runs and verdicts, newest first
pub struct ExecutionHistory {
    capacity: usize,
    entries: RwLock<VecDeque<HistoryEntry>>,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records an entry, evicting the oldest ones beyond capacity
    pub fn push(&self, record: HistoryRecord) {
        let entry = HistoryEntry {
            recorded_at: create_timestamp(),
            record,
        };

        let mut entries = self.entries.write();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Snapshot of the ledger, most recent first
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn first(&self) -> Option<HistoryEntry> {
        self.entries.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

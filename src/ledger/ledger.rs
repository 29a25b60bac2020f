// ABOUTME: RunLedger - bounded most-recent-first run history with optional durable storage.
// ABOUTME: Every persisted record goes to the in-memory list and, if configured, the store.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::record::AiRunRecord;
use super::store::RunStore;

/// How many records the in-memory history keeps.
pub const DEFAULT_LEDGER_CAPACITY: usize = 30;

pub struct RunLedger {
    recent: Mutex<VecDeque<AiRunRecord>>,
    capacity: usize,
    store: Option<Arc<dyn RunStore>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            store: None,
        }
    }

    /// Also append every record to `store`.
    pub fn store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn durable_store(&self) -> Option<&Arc<dyn RunStore>> {
        self.store.as_ref()
    }

    /// Record a run. The record lands in memory even when the store fails.
    pub async fn persist(&self, record: AiRunRecord) -> Result<(), anyhow::Error> {
        {
            let mut recent = self.recent.lock();
            recent.push_front(record.clone());
            recent.truncate(self.capacity);
        }
        debug!(id = %record.id, status = ?record.status, "Persisted run record");

        match &self.store {
            Some(store) => store.append(&record).await,
            None => Ok(()),
        }
    }

    /// In-memory history, most recent first.
    pub fn recent(&self) -> Vec<AiRunRecord> {
        self.recent.lock().iter().cloned().collect()
    }

    /// Look up a record in the in-memory history.
    pub fn get(&self, id: &str) -> Option<AiRunRecord> {
        self.recent.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.recent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.lock().is_empty()
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

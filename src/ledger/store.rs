// ABOUTME: Durable storage for run records - the RunStore trait and two backends.
// ABOUTME: MemoryRunStore keeps records in process; JsonlRunStore appends JSON lines to a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::record::{AiRunRecord, RunStatus};

/// Which records to return from [`RunStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    pub chapter_id: Option<String>,
    pub action: Option<String>,
    pub status: Option<RunStatus>,
    /// Maximum number of records, most recent first.
    pub limit: Option<usize>,
}

impl RunFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chapter(mut self, chapter_id: impl Into<String>) -> Self {
        self.chapter_id = Some(chapter_id.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &AiRunRecord) -> bool {
        self.chapter_id
            .as_ref()
            .is_none_or(|id| record.chapter_id.as_ref() == Some(id))
            && self.action.as_ref().is_none_or(|action| &record.action == action)
            && self.status.is_none_or(|status| record.status == status)
    }

    /// Filter records that are already ordered most recent first.
    fn apply<'a>(&self, records: impl Iterator<Item = &'a AiRunRecord>) -> Vec<AiRunRecord> {
        records
            .filter(|record| self.matches(record))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Durable collaborator for the run ledger.
///
/// Implement this trait to keep run history somewhere other than memory
/// or a local file.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Append a record. Existing records are never modified.
    async fn append(&self, record: &AiRunRecord) -> Result<(), anyhow::Error>;

    /// Records matching `filter`, most recent first.
    async fn list(&self, filter: &RunFilter) -> Result<Vec<AiRunRecord>, anyhow::Error>;
}

/// In-memory run store. Useful for tests and short-lived sessions.
pub struct MemoryRunStore {
    records: RwLock<Vec<AiRunRecord>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create a new store wrapped in Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn append(&self, record: &AiRunRecord) -> Result<(), anyhow::Error> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<AiRunRecord>, anyhow::Error> {
        Ok(filter.apply(self.records.read().await.iter().rev()))
    }
}

/// Append-only JSON lines file, one record per line.
pub struct JsonlRunStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RunStore for JsonlRunStore {
    async fn append(&self, record: &AiRunRecord) -> Result<(), anyhow::Error> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<AiRunRecord>, anyhow::Error> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AiRunRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping unreadable run record"
                ),
            }
        }
        Ok(filter.apply(records.iter().rev()))
    }
}

// ABOUTME: Ledger module - run records, the bounded in-memory history and durable stores.
// ABOUTME: Provides AiRunRecord, RunLedger, RunStore, MemoryRunStore and JsonlRunStore.

mod ledger;
mod record;
mod store;

pub use ledger::{DEFAULT_LEDGER_CAPACITY, RunLedger};
pub use record::{AiRunRecord, ReplayMode, RunRequest, RunResponse, RunStatus};
pub use store::{JsonlRunStore, MemoryRunStore, RunFilter, RunStore};

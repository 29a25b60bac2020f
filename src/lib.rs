// ABOUTME: Root module for quire - rate-limited, retrying LLM request orchestration.
// ABOUTME: Re-exports the orchestrator and the error types callers match on.

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod prelude;
pub mod request;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use error::AiError;
pub use orchestrator::{Orchestrator, RecordedRun};

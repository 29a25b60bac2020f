// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use quire::prelude::*;` to get started quickly.

pub use crate::agent::{Agent, AgentPipeline, AiAction, PipelineResult, RunAiActionInput};
pub use crate::config::{AiSettings, Provider, RequestPolicy, Settings};
pub use crate::coordinator::{ConcurrencyGate, GatePermit, RateLimiter};
pub use crate::error::{AiError, ConfigError, ReplayError, RequestError, SchemaError};
pub use crate::ledger::{
    AiRunRecord, JsonlRunStore, MemoryRunStore, ReplayMode, RunFilter, RunLedger, RunStatus,
    RunStore,
};
pub use crate::orchestrator::{Orchestrator, RecordedRun};
pub use crate::request::{Completion, RequestExecutor, RequestMeta};
pub use crate::transport::{
    ChatMessage, CompletionBody, Endpoint, HttpTransport, Role, Transport, TransportFailure,
    TransportResponse,
};

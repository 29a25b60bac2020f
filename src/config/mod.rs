// ABOUTME: Configuration module - settings, providers and request policy.
// ABOUTME: Everything here is plain serde data consumed read-only by the orchestrator.

mod policy;
mod provider;
mod settings;

pub use policy::*;
pub use provider::*;
pub use settings::*;

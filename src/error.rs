// ABOUTME: Defines all error types for quire using thiserror.
// ABOUTME: Each concern has its own error enum, unified under AiError.

/// Top-level error type returned by the orchestrator.
///
/// Every variant can report the structured fields a caller needs to render a
/// specific message: [`status`](Self::status), [`code`](Self::code),
/// [`attempts`](Self::attempts) and [`retries`](Self::retries).
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),
}

impl AiError {
    /// HTTP status of the failing provider call, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Request(err) => err.status(),
            _ => None,
        }
    }

    /// Short machine-readable error code.
    ///
    /// Request failures use `timeout`, `network`, `http:<status>` or `generic`.
    pub fn code(&self) -> String {
        match self {
            AiError::Config(_) => "config".to_string(),
            AiError::Request(err) => err.code(),
            AiError::Schema(_) => "schema".to_string(),
            AiError::Replay(_) => "replay".to_string(),
        }
    }

    /// Network attempts consumed by the failing call.
    pub fn attempts(&self) -> u32 {
        match self {
            AiError::Request(err) => err.attempts(),
            AiError::Schema(err) => err.attempts,
            AiError::Config(_) | AiError::Replay(_) => 0,
        }
    }

    pub fn retries(&self) -> u32 {
        self.attempts().saturating_sub(1)
    }
}

/// Errors from resolving settings, providers and agents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No agent configured")]
    NoAgentConfigured,

    #[error("No provider configured")]
    NoProviderConfigured,

    #[error("Invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
}

/// Terminal failure of one logical request after its retry budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("network failure after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: u32 },

    #[error("provider returned HTTP {status} after {attempts} attempt(s): {message}")]
    Http {
        status: u16,
        message: String,
        attempts: u32,
    },

    #[error("request failed after {attempts} attempt(s): {message}")]
    Generic { message: String, attempts: u32 },
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> String {
        match self {
            RequestError::Timeout { .. } => "timeout".to_string(),
            RequestError::Network { .. } => "network".to_string(),
            RequestError::Http { status, .. } => format!("http:{}", status),
            RequestError::Generic { .. } => "generic".to_string(),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RequestError::Timeout { attempts }
            | RequestError::Network { attempts, .. }
            | RequestError::Http { attempts, .. }
            | RequestError::Generic { attempts, .. } => *attempts,
        }
    }

    pub fn retries(&self) -> u32 {
        self.attempts().saturating_sub(1)
    }
}

/// A stage's output never satisfied its declared schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "output of agent '{agent_id}' failed schema validation after {validation_attempts} attempt(s): {reason}"
)]
pub struct SchemaError {
    /// Agent whose output was rejected.
    pub agent_id: String,
    /// Why the last output was rejected.
    pub reason: String,
    /// How many outputs were requested and checked.
    pub validation_attempts: u32,
    /// Network attempts consumed by the stage, across all validation attempts.
    pub attempts: u32,
}

/// Errors from replaying a recorded run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("unsupported action '{0}' in recorded run")]
    UnsupportedAction(String),
}

/// An action name that is not one of the known actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

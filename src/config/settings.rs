// ABOUTME: Settings - the configuration object the orchestrator consumes.
// ABOUTME: Sampling defaults, request policy, prompt overrides, providers and agents.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Provider, RequestPolicy};
use crate::agent::{Agent, AiAction};
use crate::error::ConfigError;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Full application settings as seen by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ai: AiSettings,
    pub providers: Vec<Provider>,
    pub agents: Vec<Agent>,
}

impl Settings {
    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add a provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add an agent.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Replace the request policy.
    pub fn request_policy(mut self, policy: RequestPolicy) -> Self {
        self.ai.request = policy.normalized();
        self
    }
}

/// The `ai` section of the settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub temperature: f64,
    pub max_tokens: u32,
    pub default_provider_id: Option<String>,
    pub default_agent_id: Option<String>,
    pub request: RequestPolicy,
    /// Per-action instruction overrides, keyed by action name.
    pub prompts: HashMap<String, String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            default_provider_id: None,
            default_agent_id: None,
            request: RequestPolicy::default(),
            prompts: HashMap::new(),
        }
    }
}

impl AiSettings {
    /// The task instruction for an action: the configured override when it is
    /// non-blank, otherwise the built-in default.
    pub fn instruction_for(&self, action: AiAction) -> &str {
        self.prompts
            .get(action.as_str())
            .map(String::as_str)
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| action.default_instruction())
    }
}

// ABOUTME: AiRunRecord - the serialized history entry for one run, success or failure.
// ABOUTME: Holds enough of the request to rebuild an equivalent run for replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AiAction, PipelineResult, RunAiActionInput};
use crate::config::{RequestPolicy, Settings};
use crate::error::{AiError, ReplayError};
use crate::request::RequestMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Which parameters a replay runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplayMode {
    /// The record's temperature, max tokens and request policy.
    #[default]
    Recorded,
    /// Whatever the current settings say.
    Current,
}

/// The request side of a run, as the caller asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub content: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_sequence_ids: Vec<String>,
    /// Effective temperature, after applying settings defaults.
    pub temperature: f64,
    /// Effective max tokens, after applying settings defaults.
    pub max_tokens: u32,
    pub policy: RequestPolicy,
    #[serde(default)]
    pub chapter_id: Option<String>,
}

impl RunRequest {
    pub fn from_input(input: &RunAiActionInput) -> Self {
        Self {
            content: input.content.clone(),
            context: input.context.clone(),
            provider_id: input.provider_id.clone(),
            agent_id: input.agent_id.clone(),
            agent_sequence_ids: input.agent_sequence_ids.clone(),
            temperature: input.temperature.unwrap_or(input.settings.temperature),
            max_tokens: input.max_tokens.unwrap_or(input.settings.max_tokens),
            policy: input.settings.request.normalized(),
            chapter_id: input.chapter_id.clone(),
        }
    }
}

/// The outcome side of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunResponse {
    pub content: Option<String>,
    pub error: Option<String>,
    /// Machine-readable error code, e.g. `http:429` or `schema`.
    pub code: Option<String>,
    pub status: Option<u16>,
    pub meta: RequestMeta,
    pub label: Option<String>,
}

/// One entry in the run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRunRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Action name. Kept as a string so records from newer versions still load.
    pub action: String,
    pub status: RunStatus,
    #[serde(default)]
    pub chapter_id: Option<String>,
    /// Primary provider the run resolved to.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// Agents the run resolved to, in stage order.
    #[serde(default)]
    pub agent_ids: Vec<String>,
    pub request: RunRequest,
    pub response: RunResponse,
    /// Id of the record this run replayed, if any.
    #[serde(default)]
    pub replay_of: Option<String>,
}

impl AiRunRecord {
    fn new(
        input: &RunAiActionInput,
        status: RunStatus,
        provider_id: Option<String>,
        agent_ids: Vec<String>,
        response: RunResponse,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            action: input.action.to_string(),
            status,
            chapter_id: input.chapter_id.clone(),
            provider_id,
            agent_ids,
            request: RunRequest::from_input(input),
            response,
            replay_of: None,
        }
    }

    pub fn success(input: &RunAiActionInput, result: &PipelineResult) -> Self {
        Self::new(
            input,
            RunStatus::Success,
            Some(result.provider.id.clone()),
            result.agent_sequence_ids.clone(),
            RunResponse {
                content: Some(result.content.clone()),
                meta: result.meta,
                label: Some(result.label.clone()),
                ..RunResponse::default()
            },
        )
    }

    /// Record a failed run with whatever agents and provider resolved before the error.
    pub fn failure(input: &RunAiActionInput, error: &AiError) -> Self {
        let agents = input.resolved_agents();
        let provider_id = input
            .resolved_provider(agents.first().copied())
            .map(|provider| provider.id.clone());
        let agent_ids = agents.iter().map(|agent| agent.id.clone()).collect();
        Self::new(
            input,
            RunStatus::Error,
            provider_id,
            agent_ids,
            RunResponse {
                error: Some(error.to_string()),
                code: Some(error.code()),
                status: error.status(),
                meta: RequestMeta::from_attempts(error.attempts()),
                ..RunResponse::default()
            },
        )
    }

    pub fn replay_of(mut self, original_id: impl Into<String>) -> Self {
        self.replay_of = Some(original_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Rebuild the run this record describes against `settings`.
    ///
    /// The recorded agents and provider run again, looked up in the current
    /// lists. `mode` decides whose sampling and request policy apply.
    pub fn to_input(
        &self,
        settings: &Settings,
        mode: ReplayMode,
    ) -> Result<RunAiActionInput, ReplayError> {
        let action: AiAction = self
            .action
            .parse()
            .map_err(|_| ReplayError::UnsupportedAction(self.action.clone()))?;

        let mut input = RunAiActionInput::new(action, self.request.content.clone(), settings)
            .context(self.request.context.clone());
        input.provider_id = self
            .provider_id
            .clone()
            .or_else(|| self.request.provider_id.clone());
        input.agent_id = self.request.agent_id.clone();
        input.agent_sequence_ids = if self.agent_ids.is_empty() {
            self.request.agent_sequence_ids.clone()
        } else {
            self.agent_ids.clone()
        };
        input.chapter_id = self
            .chapter_id
            .clone()
            .or_else(|| self.request.chapter_id.clone());

        if mode == ReplayMode::Recorded {
            input = input
                .temperature(self.request.temperature)
                .max_tokens(self.request.max_tokens)
                .request_policy(self.request.policy);
        }
        Ok(input)
    }
}

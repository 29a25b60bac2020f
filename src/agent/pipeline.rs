// ABOUTME: AgentPipeline - runs an action through one agent or a serial chain of agents.
// ABOUTME: Each stage goes through the RequestExecutor; schema stages re-prompt until valid.

use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use super::action::AiAction;
use super::definition::Agent;
use super::prompt::{StagePrompt, validation_hint};
use super::resolve::{resolve_agent_sequence, resolve_primary_provider, stage_provider};
use super::schema::{json_candidates, parse_json_output, validate};
use crate::config::{AiSettings, Provider, RequestPolicy, Settings};
use crate::error::{AiError, ConfigError, SchemaError};
use crate::request::{RequestExecutor, RequestMeta};
use crate::transport::CompletionBody;

/// Everything one run needs. Owns its settings so it can be recorded and replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAiActionInput {
    pub action: AiAction,
    pub content: String,
    pub context: String,
    pub settings: AiSettings,
    pub providers: Vec<Provider>,
    pub agents: Vec<Agent>,
    pub provider_id: Option<String>,
    pub agent_id: Option<String>,
    pub agent_sequence_ids: Vec<String>,
    /// Overrides `settings.temperature` for this run.
    pub temperature: Option<f64>,
    /// Overrides `settings.max_tokens` for this run.
    pub max_tokens: Option<u32>,
    pub chapter_id: Option<String>,
}

impl RunAiActionInput {
    pub fn new(action: AiAction, content: impl Into<String>, settings: &Settings) -> Self {
        Self {
            action,
            content: content.into(),
            context: String::new(),
            settings: settings.ai.clone(),
            providers: settings.providers.clone(),
            agents: settings.agents.clone(),
            provider_id: None,
            agent_id: None,
            agent_sequence_ids: Vec::new(),
            temperature: None,
            max_tokens: None,
            chapter_id: None,
        }
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Run exactly these agents, in this order.
    pub fn agent_sequence<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agent_sequence_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn chapter(mut self, chapter_id: impl Into<String>) -> Self {
        self.chapter_id = Some(chapter_id.into());
        self
    }

    /// Replace the request policy for this run.
    pub fn request_policy(mut self, policy: RequestPolicy) -> Self {
        self.settings.request = policy;
        self
    }

    /// Agents this run resolves to, in stage order.
    pub fn resolved_agents(&self) -> Vec<&Agent> {
        resolve_agent_sequence(
            &self.agents,
            &self.agent_sequence_ids,
            self.agent_id.as_deref(),
            self.settings.default_agent_id.as_deref(),
        )
    }

    /// Primary provider for a run whose first stage is `first`.
    pub fn resolved_provider(&self, first: Option<&Agent>) -> Option<&Provider> {
        resolve_primary_provider(
            &self.providers,
            self.provider_id.as_deref(),
            first,
            self.settings.default_provider_id.as_deref(),
        )
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Output of the final stage.
    pub content: String,
    /// Agent that produced `content`.
    pub agent: Agent,
    /// Primary provider of the run.
    pub provider: Provider,
    pub label: String,
    /// Attempts and retries summed over every network call in the run.
    pub meta: RequestMeta,
    /// Ids of the agents that ran, in order.
    pub agent_sequence_ids: Vec<String>,
}

/// Per-run values shared by every stage.
struct RunPlan<'a> {
    instruction: &'a str,
    context: &'a str,
    policy: RequestPolicy,
    temperature: f64,
    max_tokens: u32,
}

/// Drives agents through a [`RequestExecutor`].
pub struct AgentPipeline<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> AgentPipeline<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Resolve the agents for `input` and run them in order.
    pub async fn run(&self, input: &RunAiActionInput) -> Result<PipelineResult, AiError> {
        let span = info_span!(
            "ai_run",
            action = %input.action,
            chapter_id = input.chapter_id.as_deref().unwrap_or(""),
        );
        self.run_stages(input).instrument(span).await
    }

    async fn run_stages(&self, input: &RunAiActionInput) -> Result<PipelineResult, AiError> {
        let settings = &input.settings;
        let stages = input.resolved_agents();
        let (Some(first), Some(last)) = (stages.first(), stages.last()) else {
            return Err(ConfigError::NoAgentConfigured.into());
        };
        let primary = input
            .resolved_provider(Some(*first))
            .ok_or(ConfigError::NoProviderConfigured)?;

        let plan = RunPlan {
            instruction: settings.instruction_for(input.action),
            context: &input.context,
            policy: settings.request.normalized(),
            temperature: input.temperature.unwrap_or(settings.temperature),
            max_tokens: input.max_tokens.unwrap_or(settings.max_tokens),
        };

        info!(
            stages = stages.len(),
            provider = %primary.id,
            "Starting AI run"
        );

        let mut content = input.content.clone();
        let mut meta = RequestMeta::default();
        for (index, agent) in stages.iter().enumerate() {
            let provider = stage_provider(&input.providers, agent, primary);
            info!(
                stage = index + 1,
                agent = %agent.id,
                provider = %provider.id,
                "Running stage"
            );
            content = self
                .run_stage(&plan, agent, provider, &content, &mut meta)
                .await?;
        }

        let names: Vec<&str> = stages.iter().map(|agent| agent.display_name()).collect();
        let label = format!("{} · {}", names.join(" → "), primary.display_name());

        info!(
            attempts = meta.attempts,
            retries = meta.retries,
            "AI run completed"
        );

        Ok(PipelineResult {
            content,
            agent: (*last).clone(),
            provider: primary.clone(),
            label,
            meta,
            agent_sequence_ids: stages.iter().map(|agent| agent.id.clone()).collect(),
        })
    }

    /// Run one stage. Without a schema the first completion is the output;
    /// with one, up to `max_retries + 1` completions are checked.
    async fn run_stage(
        &self,
        plan: &RunPlan<'_>,
        agent: &Agent,
        provider: &Provider,
        content: &str,
        meta: &mut RequestMeta,
    ) -> Result<String, AiError> {
        let endpoint = provider.endpoint();
        let schema = agent.output_schema.as_ref();
        let budget = plan.policy.max_attempts();
        let mut hint: Option<String> = None;
        let mut validation_attempts = 0;
        let mut network_attempts = 0;

        loop {
            let prompt = StagePrompt {
                instruction: plan.instruction,
                content,
                context: plan.context,
                system_prompt: &agent.system_prompt,
                output_schema: schema,
                validation_hint: hint.as_deref(),
            };
            let body = CompletionBody::new(&provider.model)
                .messages(prompt.messages())
                .temperature(plan.temperature)
                .max_tokens(plan.max_tokens);

            let completion = self
                .executor
                .complete(&endpoint, &body, &plan.policy)
                .await?;
            meta.absorb(completion.meta);

            let Some(schema) = schema else {
                return Ok(completion.content);
            };

            validation_attempts += 1;
            network_attempts += completion.meta.attempts;

            match check_output(&completion.content, schema) {
                Ok(value) => {
                    debug!(agent = %agent.id, validation_attempts, "Stage output accepted");
                    return Ok(serde_json::to_string_pretty(&value).unwrap_or(completion.content));
                }
                Err(reason) if validation_attempts < budget => {
                    warn!(
                        agent = %agent.id,
                        validation_attempts,
                        reason = %reason,
                        "Stage output rejected, re-prompting"
                    );
                    hint = Some(validation_hint(&reason));
                }
                Err(reason) => {
                    return Err(SchemaError {
                        agent_id: agent.id.clone(),
                        reason,
                        validation_attempts,
                        attempts: network_attempts,
                    }
                    .into());
                }
            }
        }
    }
}

/// First JSON value in `text` that satisfies `schema`. Reports the violation of
/// the most likely candidate when none does.
fn check_output(text: &str, schema: &Value) -> Result<Value, String> {
    let mut first_violation = None;
    for value in json_candidates(text) {
        match validate(&value, schema) {
            Ok(()) => return Ok(value),
            Err(violation) => {
                first_violation.get_or_insert(violation);
            }
        }
    }
    match first_violation {
        Some(violation) => Err(violation.to_string()),
        None => parse_json_output(text),
    }
}

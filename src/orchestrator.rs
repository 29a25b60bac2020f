// ABOUTME: Orchestrator - the entry point tying executor, agent pipeline and run ledger together.
// ABOUTME: Runs actions, records their outcome and replays recorded runs.

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::{AgentPipeline, PipelineResult, RunAiActionInput};
use crate::config::{AiSettings, Provider, Settings};
use crate::error::AiError;
use crate::ledger::{AiRunRecord, ReplayMode, RunLedger};
use crate::request::{Completion, RequestExecutor};
use crate::transport::{ChatMessage, CompletionBody, HttpTransport, Transport};

/// A finished run together with the record written for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    pub result: PipelineResult,
    pub record: AiRunRecord,
}

/// Shared state for every request an application makes.
///
/// One orchestrator owns one rate limiter and one concurrency gate, so all
/// runs through it are throttled together.
pub struct Orchestrator {
    executor: RequestExecutor,
    ledger: RunLedger,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            executor: RequestExecutor::new(transport),
            ledger: RunLedger::new(),
        }
    }

    /// Orchestrator talking to real providers over HTTP.
    pub fn http() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }

    pub fn with_ledger(mut self, ledger: RunLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    /// Send a single chat request to `provider` outside of any agent.
    pub async fn complete(
        &self,
        provider: &Provider,
        messages: Vec<ChatMessage>,
        settings: &AiSettings,
    ) -> Result<Completion, AiError> {
        let body = CompletionBody::new(&provider.model)
            .messages(messages)
            .temperature(settings.temperature)
            .max_tokens(settings.max_tokens);
        Ok(self
            .executor
            .complete(&provider.endpoint(), &body, &settings.request)
            .await?)
    }

    /// Run an action without recording it.
    pub async fn run_ai_action(&self, input: &RunAiActionInput) -> Result<PipelineResult, AiError> {
        AgentPipeline::new(&self.executor).run(input).await
    }

    /// Run an action and record the outcome, success or failure.
    ///
    /// A failed run is recorded and its error still returned.
    pub async fn run_and_record(&self, input: &RunAiActionInput) -> Result<RecordedRun, AiError> {
        self.execute_and_record(input, None).await
    }

    /// Run a recorded request again. The new run gets its own record; the
    /// original is left untouched.
    pub async fn replay_run(
        &self,
        record: &AiRunRecord,
        settings: &Settings,
        mode: ReplayMode,
    ) -> Result<RecordedRun, AiError> {
        let input = record.to_input(settings, mode)?;
        info!(original = %record.id, mode = ?mode, "Replaying run");
        self.execute_and_record(&input, Some(&record.id)).await
    }

    async fn execute_and_record(
        &self,
        input: &RunAiActionInput,
        replay_of: Option<&str>,
    ) -> Result<RecordedRun, AiError> {
        let outcome = self.run_ai_action(input).await;

        let mut record = match &outcome {
            Ok(result) => AiRunRecord::success(input, result),
            Err(err) => AiRunRecord::failure(input, err),
        };
        if let Some(original) = replay_of {
            record = record.replay_of(original);
        }

        if let Err(e) = self.ledger.persist(record.clone()).await {
            warn!(id = %record.id, error = %e, "Failed to store run record");
        }

        let result = outcome?;
        Ok(RecordedRun { result, record })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AiAction};
    use crate::config::RequestPolicy;
    use crate::error::ReplayError;
    use crate::ledger::{MemoryRunStore, RunFilter, RunStatus, RunStore};
    use crate::test_support::{ScriptedTransport, reply, status};

    fn settings() -> Settings {
        Settings::default()
            .provider(Provider::new("local", "http://local.test/v1").name("Local"))
            .agent(Agent::new("editor", "Edit.").name("Editor"))
            .request_policy(RequestPolicy::default().max_retries(0).retry_delay_ms(0))
    }

    #[tokio::test]
    async fn test_complete_single_request() {
        let transport = Arc::new(ScriptedTransport::new(vec![reply("pong")]));
        let orchestrator = Orchestrator::new(transport.clone());
        let settings = settings();

        let completion = orchestrator
            .complete(&settings.providers[0], vec![ChatMessage::user("ping")], &settings.ai)
            .await
            .unwrap();

        assert_eq!(completion.content, "pong");
        assert_eq!(transport.calls()[0].body.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn test_run_and_record_success() {
        let store = MemoryRunStore::shared();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedTransport::new(vec![reply("done")])))
            .with_ledger(RunLedger::new().store(store.clone()));
        let input = RunAiActionInput::new(AiAction::Rewrite, "draft", &settings()).chapter("ch-1");

        let run = orchestrator.run_and_record(&input).await.unwrap();

        assert_eq!(run.result.content, "done");
        assert_eq!(run.record.status, RunStatus::Success);
        assert_eq!(run.record.response.content.as_deref(), Some("done"));
        assert_eq!(run.record.response.label.as_deref(), Some("Editor · Local"));
        assert_eq!(orchestrator.ledger().recent(), vec![run.record.clone()]);
        assert_eq!(
            store.list(&RunFilter::new().chapter("ch-1")).await.unwrap(),
            vec![run.record]
        );
    }

    #[tokio::test]
    async fn test_failed_run_is_recorded_and_returned() {
        let orchestrator = Orchestrator::new(Arc::new(ScriptedTransport::new(vec![status(400)])));
        let input = RunAiActionInput::new(AiAction::Rewrite, "draft", &settings());

        let err = orchestrator.run_and_record(&input).await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let recent = orchestrator.ledger().recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, RunStatus::Error);
        assert_eq!(recent[0].response.code.as_deref(), Some("http:400"));
        assert_eq!(recent[0].response.meta.attempts, 1);
    }

    #[tokio::test]
    async fn test_replay_creates_new_record() {
        let orchestrator = Orchestrator::new(Arc::new(ScriptedTransport::new(vec![
            reply("first"),
            reply("second"),
        ])));
        let settings = settings();
        let input = RunAiActionInput::new(AiAction::Expand, "seed", &settings).context("ctx");

        let original = orchestrator.run_and_record(&input).await.unwrap();
        let replayed = orchestrator
            .replay_run(&original.record, &settings, ReplayMode::Recorded)
            .await
            .unwrap();

        assert_ne!(replayed.record.id, original.record.id);
        assert_eq!(replayed.record.replay_of.as_deref(), Some(original.record.id.as_str()));
        assert_eq!(replayed.record.action, original.record.action);
        assert_eq!(replayed.record.agent_ids, original.record.agent_ids);
        assert_eq!(replayed.record.provider_id, original.record.provider_id);
        assert_eq!(replayed.record.request.content, original.record.request.content);
        assert_eq!(replayed.record.request.context, original.record.request.context);
        assert_eq!(replayed.record.request.policy, original.record.request.policy);
        assert_eq!(replayed.result.content, "second");

        // History keeps both, newest first.
        let recent = orchestrator.ledger().recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, replayed.record.id);
        assert_eq!(orchestrator.ledger().get(&original.record.id), Some(original.record));
    }

    #[tokio::test]
    async fn test_replay_reuses_recorded_agents_and_provider() {
        let transport = Arc::new(ScriptedTransport::new(vec![reply("original"), reply("again")]));
        let orchestrator = Orchestrator::new(transport.clone());
        let mut recorded_settings = Settings::default()
            .provider(Provider::new("p1", "http://p1.test/v1"))
            .provider(Provider::new("p2", "http://p2.test/v1"))
            .agent(Agent::new("editor", "Edit."))
            .agent(Agent::new("critic", "Critique."))
            .request_policy(RequestPolicy::default().max_retries(0).retry_delay_ms(0));
        recorded_settings.ai.default_agent_id = Some("editor".into());
        recorded_settings.ai.default_provider_id = Some("p1".into());
        let input =
            RunAiActionInput::new(AiAction::Rewrite, "seed", &recorded_settings).chapter("ch-3");

        let original = orchestrator.run_and_record(&input).await.unwrap();
        assert_eq!(original.record.agent_ids, vec!["editor"]);
        assert_eq!(original.record.provider_id.as_deref(), Some("p1"));
        assert_eq!(original.record.chapter_id.as_deref(), Some("ch-3"));

        let mut current = recorded_settings.clone();
        current.ai.default_agent_id = Some("critic".into());
        current.ai.default_provider_id = Some("p2".into());
        let replayed = orchestrator
            .replay_run(&original.record, &current, ReplayMode::Recorded)
            .await
            .unwrap();

        assert_eq!(replayed.result.agent_sequence_ids, vec!["editor"]);
        assert_eq!(replayed.result.provider.id, "p1");
        assert_eq!(replayed.record.agent_ids, vec!["editor"]);
        assert_eq!(replayed.record.provider_id.as_deref(), Some("p1"));
        let calls = transport.calls();
        assert_eq!(calls[1].url, "http://p1.test/v1/chat/completions");
        assert!(calls[1].body.messages[0].content.contains("Edit."));
    }

    #[tokio::test]
    async fn test_failed_run_records_resolved_targets() {
        let orchestrator = Orchestrator::new(Arc::new(ScriptedTransport::new(vec![status(500)])));
        let input = RunAiActionInput::new(AiAction::Rewrite, "draft", &settings());

        orchestrator.run_and_record(&input).await.unwrap_err();

        let record = &orchestrator.ledger().recent()[0];
        assert_eq!(record.agent_ids, vec!["editor"]);
        assert_eq!(record.provider_id.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_replay_unsupported_action() {
        let orchestrator = Orchestrator::new(Arc::new(ScriptedTransport::new(vec![reply("x")])));
        let settings = settings();
        let input = RunAiActionInput::new(AiAction::Rewrite, "seed", &settings);
        let mut record = orchestrator.run_and_record(&input).await.unwrap().record;
        record.action = "translate".into();

        let err = orchestrator
            .replay_run(&record, &settings, ReplayMode::Current)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AiError::Replay(ReplayError::UnsupportedAction(ref action)) if action == "translate"
        ));
        assert_eq!(err.code(), "replay");
        assert_eq!(orchestrator.ledger().len(), 1);
    }
}

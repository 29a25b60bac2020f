// ABOUTME: Agent descriptor - a system prompt bound to a provider, optionally a pipeline stage.
// ABOUTME: Serial agents form an ordered pipeline; others are picked one at a time.

use serde::{Deserialize, Serialize};

/// Definition of an agent that can run a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Unique identifier for this agent.
    pub id: String,

    /// Display name used in result labels.
    #[serde(default)]
    pub name: String,

    /// Provider this agent talks to. When it does not resolve, the
    /// pipeline's primary provider is used instead.
    #[serde(default)]
    pub provider_id: Option<String>,

    /// System prompt for this agent.
    #[serde(default)]
    pub system_prompt: String,

    /// Whether this agent takes part in the serial pipeline.
    #[serde(default)]
    pub serial_enabled: bool,

    /// Position in the serial pipeline. Defaults to the agent's index in the
    /// configured list.
    #[serde(default)]
    pub serial_order: Option<i64>,

    /// JSON-Schema-like contract the agent's output must satisfy.
    /// When set, the agent is instructed to answer with strict JSON only.
    #[serde(default)]
    pub output_schema: Option<serde_json::Value>,
}

impl Agent {
    /// Create a new agent with required fields. The name defaults to the id.
    pub fn new(id: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider_id: None,
            system_prompt: system_prompt.into(),
            serial_enabled: false,
            serial_order: None,
            output_schema: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind the agent to a provider.
    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Enlist the agent in the serial pipeline at the given order.
    pub fn serial(mut self, order: i64) -> Self {
        self.serial_enabled = true;
        self.serial_order = Some(order);
        self
    }

    /// Require the agent's output to satisfy a schema.
    pub fn output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Name for labels; falls back to the id when no name is configured.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_builder() {
        let agent = Agent::new("critic", "You critique drafts.")
            .name("Critic")
            .provider("openai")
            .serial(2)
            .output_schema(serde_json::json!({"type": "object"}));

        assert_eq!(agent.id, "critic");
        assert_eq!(agent.display_name(), "Critic");
        assert_eq!(agent.provider_id.as_deref(), Some("openai"));
        assert!(agent.serial_enabled);
        assert_eq!(agent.serial_order, Some(2));
        assert!(agent.output_schema.is_some());
    }

    #[test]
    fn test_agent_deserialize_defaults() {
        let agent: Agent = serde_json::from_str(r#"{"id": "plain"}"#).unwrap();
        assert_eq!(agent.display_name(), "plain");
        assert!(!agent.serial_enabled);
        assert!(agent.serial_order.is_none());
        assert!(agent.output_schema.is_none());
    }
}

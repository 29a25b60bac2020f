// ABOUTME: Agent module - agent definitions, actions, resolution and the multi-stage pipeline.
// ABOUTME: Provides Agent, AiAction, AgentPipeline and the schema helpers stages rely on.

mod action;
mod definition;
mod pipeline;
mod prompt;
mod resolve;
mod schema;

pub use action::AiAction;
pub use definition::Agent;
pub use pipeline::{AgentPipeline, PipelineResult, RunAiActionInput};
pub use prompt::{StagePrompt, schema_instruction, validation_hint};
pub use resolve::{find_agent, resolve_agent_sequence, resolve_primary_provider, stage_provider};
pub use schema::{SchemaViolation, json_candidates, parse_json_output, validate};

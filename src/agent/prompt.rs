// ABOUTME: Builds the chat messages for one pipeline stage.
// ABOUTME: System prompt plus optional schema instruction, user turn with task, context and content.

use serde_json::Value;

use crate::transport::ChatMessage;

/// Inputs for one stage's prompt.
#[derive(Debug, Clone, Copy)]
pub struct StagePrompt<'a> {
    /// Task instruction for the action.
    pub instruction: &'a str,
    /// Text the stage operates on; the previous stage's output after the first.
    pub content: &'a str,
    /// Surrounding material the model may draw on but should not rewrite.
    pub context: &'a str,
    pub system_prompt: &'a str,
    pub output_schema: Option<&'a Value>,
    /// Feedback about the previous output's schema failure.
    pub validation_hint: Option<&'a str>,
}

impl StagePrompt<'_> {
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut system = self.system_prompt.trim().to_string();
        if let Some(schema) = self.output_schema {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str(&schema_instruction(schema));
        }

        let mut user = self.instruction.trim().to_string();
        if !self.context.trim().is_empty() {
            user.push_str("\n\nContext:\n");
            user.push_str(self.context.trim());
        }
        user.push_str("\n\nCurrent content:\n");
        user.push_str(self.content);
        if let Some(hint) = self.validation_hint {
            user.push_str("\n\n");
            user.push_str(hint);
        }

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(user));
        messages
    }
}

/// Instruction telling the model to answer with JSON matching `schema` and nothing else.
pub fn schema_instruction(schema: &Value) -> String {
    let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "Respond with strict JSON only. No prose and no Markdown. \
         The JSON must satisfy this schema:\n{}",
        rendered
    )
}

/// Re-prompt text after a rejected output.
pub fn validation_hint(reason: &str) -> String {
    format!(
        "Your previous response was rejected: {}. \
         Reply again with JSON that satisfies the schema exactly.",
        reason
    )
}

// ABOUTME: Test doubles shared by unit tests across modules.
// ABOUTME: ScriptedTransport replays a fixed sequence of provider outcomes and records calls.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::transport::{CompletionBody, Endpoint, Transport, TransportFailure, TransportResponse};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Respond(TransportResponse),
    Fail(TransportFailure),
    /// Sleep, then answer 200 with the given content.
    Stall(Duration, String),
}

/// 200 response in the OpenAI chat-completions shape.
pub(crate) fn reply(content: &str) -> Step {
    Step::Respond(completion_response(content))
}

fn completion_response(content: &str) -> TransportResponse {
    let body = serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    });
    TransportResponse::new(200, body.to_string())
}

/// Error response with an OpenAI-style error body.
pub(crate) fn status(code: u16) -> Step {
    let body = serde_json::json!({"error": {"message": format!("status {}", code), "type": "test"}});
    Step::Respond(TransportResponse::new(code, body.to_string()))
}

/// A recorded call to the transport.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub url: String,
    pub body: CompletionBody,
}

/// Transport that plays back `steps` in order. The last step repeats forever.
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        if steps.len() > 1 {
            steps.pop_front().expect("non-empty script")
        } else {
            steps.front().cloned().expect("non-empty script")
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: &CompletionBody,
    ) -> Result<TransportResponse, TransportFailure> {
        self.calls.lock().push(Call {
            url: endpoint.url.clone(),
            body: body.clone(),
        });

        match self.next_step() {
            Step::Respond(response) => Ok(response),
            Step::Fail(failure) => Err(failure),
            Step::Stall(delay, content) => {
                tokio::time::sleep(delay).await;
                Ok(completion_response(&content))
            }
        }
    }
}

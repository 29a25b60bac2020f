// ABOUTME: Defines the Transport trait - the abstraction that lets the executor
// ABOUTME: talk to any OpenAI-compatible provider, or to a test double.

use async_trait::async_trait;
use serde_json::Value;

use super::CompletionBody;

/// Where to send a completion request.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Full chat-completions URL.
    pub url: String,
    /// Bearer token; empty for unauthenticated local servers.
    pub token: String,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .finish()
    }
}

/// Raw result of one transport attempt that reached the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Extract the completion text from a successful response.
    ///
    /// Looks at `choices[0].message.content`, then `choices[0].text`, then a
    /// top-level `content` string. A body that is not JSON is taken verbatim.
    /// Returns `None` when nothing non-empty is found.
    pub fn completion_text(&self) -> Option<String> {
        let text = match self.json() {
            Ok(json) => {
                let choice = &json["choices"][0];
                choice["message"]["content"]
                    .as_str()
                    .or_else(|| choice["text"].as_str())
                    .or_else(|| json["content"].as_str())
                    .map(str::to_string)
            }
            Err(_) => Some(self.body.clone()),
        }?;
        if text.trim().is_empty() { None } else { Some(text) }
    }

    /// Best-effort human readable message for an error response.
    pub fn error_message(&self) -> String {
        if let Ok(json) = self.json() {
            let message = json["error"]["message"]
                .as_str()
                .or_else(|| json["error"].as_str())
                .or_else(|| json["message"].as_str());
            if let Some(message) = message {
                return message.to_string();
            }
        }
        let body = self.body.trim();
        if body.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            body.chars().take(500).collect()
        }
    }
}

/// A transport attempt that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    #[error("transport timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

/// Sends one completion request to a provider.
///
/// Implementations perform exactly one attempt; retries, timeouts and
/// throttling belong to the executor. Dropping the returned future must
/// abandon the in-flight call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: &CompletionBody,
    ) -> Result<TransportResponse, TransportFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text_openai_shape() {
        let response = TransportResponse::new(
            200,
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello!"}}]}"#,
        );
        assert_eq!(response.completion_text().as_deref(), Some("Hello!"));
    }

    #[test]
    fn test_completion_text_fallbacks() {
        let legacy = TransportResponse::new(200, r#"{"choices":[{"text":"legacy"}]}"#);
        assert_eq!(legacy.completion_text().as_deref(), Some("legacy"));

        let flat = TransportResponse::new(200, r#"{"content":"done"}"#);
        assert_eq!(flat.completion_text().as_deref(), Some("done"));

        let plain = TransportResponse::new(200, "just text");
        assert_eq!(plain.completion_text().as_deref(), Some("just text"));
    }

    #[test]
    fn test_completion_text_empty() {
        let empty = TransportResponse::new(200, r#"{"choices":[{"message":{"content":"  "}}]}"#);
        assert!(empty.completion_text().is_none());

        let missing = TransportResponse::new(200, r#"{"choices":[]}"#);
        assert!(missing.completion_text().is_none());
    }

    #[test]
    fn test_error_message() {
        let openai = TransportResponse::new(
            429,
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
        );
        assert_eq!(openai.error_message(), "Rate limit reached");

        let raw = TransportResponse::new(502, "Bad Gateway");
        assert_eq!(raw.error_message(), "Bad Gateway");

        let blank = TransportResponse::new(500, "");
        assert_eq!(blank.error_message(), "HTTP 500");
    }

    #[test]
    fn test_endpoint_debug_redacts_token() {
        let endpoint = Endpoint::new("http://x/chat/completions", "secret");
        assert!(!format!("{:?}", endpoint).contains("secret"));
    }
}

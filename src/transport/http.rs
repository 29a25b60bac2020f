// ABOUTME: HTTP transport implementation over reqwest.
// ABOUTME: Posts OpenAI-compatible chat-completion bodies with bearer auth.

use async_trait::async_trait;

use super::{CompletionBody, Endpoint, Transport, TransportFailure, TransportResponse};

/// Transport for OpenAI-compatible HTTP APIs.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport sharing an existing reqwest client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: &CompletionBody,
    ) -> Result<TransportResponse, TransportFailure> {
        let mut request = self
            .http
            .post(&endpoint.url)
            .header("Content-Type", "application/json")
            .json(body);

        if !endpoint.token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", endpoint.token));
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

// ABOUTME: RequestExecutor - runs one logical completion request end to end.
// ABOUTME: Rate-limit token, concurrency slot, then the timed attempt loop with backoff.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::retry::{AttemptFailure, compute_retry_delay};
use crate::config::RequestPolicy;
use crate::coordinator::{ConcurrencyGate, RateLimiter};
use crate::error::RequestError;
use crate::transport::{CompletionBody, Endpoint, Transport};

/// Attempt accounting for one or more logical requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub attempts: u32,
    pub retries: u32,
}

impl RequestMeta {
    /// Meta for a single request that took `attempts` attempts.
    pub fn from_attempts(attempts: u32) -> Self {
        Self {
            attempts,
            retries: attempts.saturating_sub(1),
        }
    }

    /// Add another request's counts to this one.
    pub fn absorb(&mut self, other: RequestMeta) {
        self.attempts += other.attempts;
        self.retries += other.retries;
    }
}

/// Successful result of a logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub meta: RequestMeta,
}

/// Executes logical requests against a transport.
///
/// All requests through one executor share its rate limiter and concurrency
/// gate. The rate and limit come from each call's policy; the most recent
/// call's values apply to everyone.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    gate: ConcurrencyGate,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(),
            gate: ConcurrencyGate::new(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Send one logical request, retrying transient failures per `policy`.
    ///
    /// Consumes exactly one rate-limit token and holds one concurrency slot
    /// for the whole attempt loop, retries included.
    pub async fn complete(
        &self,
        endpoint: &Endpoint,
        body: &CompletionBody,
        policy: &RequestPolicy,
    ) -> Result<Completion, RequestError> {
        let policy = policy.normalized();

        self.limiter.acquire(policy.rate_limit_per_minute).await;
        let _permit = self.gate.acquire(policy.max_concurrency).await;

        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                attempt,
                max_attempts,
                url = %endpoint.url,
                model = %body.model,
                "Sending completion request"
            );

            let failure = match self.attempt(endpoint, body, policy.timeout()).await {
                Ok(content) => {
                    return Ok(Completion {
                        content,
                        meta: RequestMeta::from_attempts(attempt),
                    });
                }
                Err(failure) => failure,
            };

            if failure.is_retryable() && attempt < max_attempts {
                let delay = compute_retry_delay(policy.retry_delay_ms, attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    failure = ?failure,
                    "Completion attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            let error = failure.into_error(attempt);
            warn!(
                attempts = attempt,
                code = %error.code(),
                error = %error,
                "Completion request failed"
            );
            return Err(error);
        }
    }

    /// One transport attempt bounded by `timeout`. Expiry drops the in-flight call.
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        body: &CompletionBody,
        timeout: Option<Duration>,
    ) -> Result<String, AttemptFailure> {
        let send = self.transport.send(endpoint, body);
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| AttemptFailure::Timeout)?,
            None => send.await,
        };
        let response = result?;

        if !response.is_success() {
            return Err(AttemptFailure::Http {
                status: response.status,
                message: response.error_message(),
            });
        }

        response.completion_text().ok_or_else(|| {
            AttemptFailure::Application("provider returned an empty completion".to_string())
        })
    }
}

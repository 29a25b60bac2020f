// ABOUTME: Retry controller - classifies attempt failures and computes backoff delays.
// ABOUTME: Exponential backoff capped at 2^3 x base plus bounded jitter, never above 10s.

use std::time::Duration;

use rand::Rng;

use crate::error::RequestError;
use crate::transport::TransportFailure;

/// Upper bound on any single backoff sleep.
pub const MAX_BACKOFF_MS: u64 = 10_000;

const MAX_JITTER_MS: u64 = 250;
const MAX_BACKOFF_EXPONENT: u32 = 3;

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The per-attempt timer fired before the provider answered.
    Timeout,
    /// The request never completed at the network level.
    Network(String),
    /// The provider answered with a non-2xx status.
    Http { status: u16, message: String },
    /// The provider answered 2xx but the response was unusable.
    Application(String),
}

impl AttemptFailure {
    /// Whether another attempt may succeed.
    ///
    /// Timeouts, network failures and HTTP 408, 429 and 5xx are retryable;
    /// everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::Timeout | AttemptFailure::Network(_) => true,
            AttemptFailure::Http { status, .. } => is_retryable_status(*status),
            AttemptFailure::Application(_) => false,
        }
    }

    /// Convert into the caller-facing error once the loop gives up.
    pub fn into_error(self, attempts: u32) -> RequestError {
        match self {
            AttemptFailure::Timeout => RequestError::Timeout { attempts },
            AttemptFailure::Network(message) => RequestError::Network { message, attempts },
            AttemptFailure::Http { status, message } => RequestError::Http {
                status,
                message,
                attempts,
            },
            AttemptFailure::Application(message) => RequestError::Generic { message, attempts },
        }
    }
}

impl From<TransportFailure> for AttemptFailure {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Timeout => AttemptFailure::Timeout,
            TransportFailure::Network(message) => AttemptFailure::Network(message),
        }
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

/// Backoff before the retry that follows failed attempt number `attempt` (1-based).
///
/// `base_ms = 0` disables backoff entirely.
pub fn compute_retry_delay(base_ms: u64, attempt: u32) -> Duration {
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::thread_rng().gen_range(0..=base_ms.min(MAX_JITTER_MS));
    backoff_delay(base_ms, attempt, jitter_ms)
}

/// Deterministic part of [`compute_retry_delay`] with the jitter supplied.
pub fn backoff_delay(base_ms: u64, attempt: u32, jitter_ms: u64) -> Duration {
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    let scaled = base_ms.saturating_mul(1 << exponent);
    Duration::from_millis(scaled.saturating_add(jitter_ms).min(MAX_BACKOFF_MS))
}

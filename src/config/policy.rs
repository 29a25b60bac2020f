// ABOUTME: RequestPolicy - timeout, retry, concurrency and rate settings per call.
// ABOUTME: Values are clamped into their allowed ranges at the deserialization boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_TIMEOUT_MS: u64 = 120_000;
pub const MAX_RETRIES: u32 = 5;
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;
pub const MAX_CONCURRENCY: usize = 10;
pub const MAX_RATE_LIMIT_PER_MINUTE: u32 = 600;

/// Limits applied to one logical request.
///
/// Construct with [`RequestPolicy::default`] and the builder setters, or
/// deserialize from settings. Either way the values end up clamped:
///
/// | field | range |
/// |---|---|
/// | `timeout_ms` | 0..=120000 (0 disables the timeout) |
/// | `max_retries` | 0..=5 |
/// | `retry_delay_ms` | 0..=10000 |
/// | `max_concurrency` | 1..=10 |
/// | `rate_limit_per_minute` | 0..=600 (0 disables rate limiting) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRequestPolicy")]
pub struct RequestPolicy {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_concurrency: usize,
    pub rate_limit_per_minute: u32,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 2,
            retry_delay_ms: 1_000,
            max_concurrency: 2,
            rate_limit_per_minute: 0,
        }
    }
}

impl RequestPolicy {
    /// Set the per-attempt timeout in milliseconds.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self.normalized()
    }

    /// Set how many times a retryable failure is retried.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self.normalized()
    }

    /// Set the base backoff delay in milliseconds.
    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self.normalized()
    }

    /// Set how many logical requests may be in flight at once.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self.normalized()
    }

    /// Set how many logical requests may start per minute.
    pub fn rate_limit_per_minute(mut self, rate: u32) -> Self {
        self.rate_limit_per_minute = rate;
        self.normalized()
    }

    /// Clamp every field into its allowed range.
    pub fn normalized(self) -> Self {
        Self {
            timeout_ms: self.timeout_ms.min(MAX_TIMEOUT_MS),
            max_retries: self.max_retries.min(MAX_RETRIES),
            retry_delay_ms: self.retry_delay_ms.min(MAX_RETRY_DELAY_MS),
            max_concurrency: self.max_concurrency.clamp(1, MAX_CONCURRENCY),
            rate_limit_per_minute: self.rate_limit_per_minute.min(MAX_RATE_LIMIT_PER_MINUTE),
        }
    }

    /// The per-attempt timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    /// Total attempts one logical request may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1).max(1)
    }
}

/// Wire shape of a policy before normalization. Every field is loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRequestPolicy {
    timeout_ms: Option<Value>,
    max_retries: Option<Value>,
    retry_delay_ms: Option<Value>,
    max_concurrency: Option<Value>,
    rate_limit_per_minute: Option<Value>,
}

impl From<RawRequestPolicy> for RequestPolicy {
    fn from(raw: RawRequestPolicy) -> Self {
        let defaults = RequestPolicy::default();
        Self {
            timeout_ms: clamp_field(
                raw.timeout_ms.as_ref(),
                defaults.timeout_ms as f64,
                0.0,
                MAX_TIMEOUT_MS as f64,
            ) as u64,
            max_retries: clamp_field(
                raw.max_retries.as_ref(),
                defaults.max_retries as f64,
                0.0,
                MAX_RETRIES as f64,
            ) as u32,
            retry_delay_ms: clamp_field(
                raw.retry_delay_ms.as_ref(),
                defaults.retry_delay_ms as f64,
                0.0,
                MAX_RETRY_DELAY_MS as f64,
            ) as u64,
            max_concurrency: clamp_field(
                raw.max_concurrency.as_ref(),
                defaults.max_concurrency as f64,
                1.0,
                MAX_CONCURRENCY as f64,
            ) as usize,
            rate_limit_per_minute: clamp_field(
                raw.rate_limit_per_minute.as_ref(),
                defaults.rate_limit_per_minute as f64,
                0.0,
                MAX_RATE_LIMIT_PER_MINUTE as f64,
            ) as u32,
        }
    }
}

/// Read a number (or numeric string), truncate it, and clamp it into range.
fn clamp_field(value: Option<&Value>, default: f64, min: f64, max: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => n.trunc().clamp(min, max),
        _ => default,
    }
}

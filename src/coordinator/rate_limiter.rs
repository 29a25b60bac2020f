// ABOUTME: Token bucket rate limiter for logical request starts.
// ABOUTME: Rate is per minute and reconfigured in place when the caller's rate changes.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Mutable state for the rate limiter, protected by a single mutex.
struct RateLimiterState {
    tokens: f64,
    last_refill: Instant,
    configured_rate: u32,
}

impl RateLimiterState {
    /// Bring the bucket up to date for `rate` tokens per minute.
    ///
    /// A rate different from the configured one resets the bucket to full.
    fn refill(&mut self, rate: u32, now: Instant) {
        if self.configured_rate != rate {
            self.configured_rate = rate;
            self.tokens = rate as f64;
            self.last_refill = now;
            return;
        }

        let elapsed_ms = now.duration_since(self.last_refill).as_secs_f64() * 1000.0;
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed_ms / MS_PER_MINUTE * rate as f64).min(rate as f64);
    }
}

/// Token bucket rate limiter shared by every request of one orchestrator.
///
/// The bucket holds at most `rate` tokens and refills continuously at `rate`
/// tokens per minute, so up to `rate` requests may start in a burst. Waiters
/// poll: each computes how long until one token exists, sleeps, and checks
/// again. There is no ordering guarantee among waiters.
pub struct RateLimiter {
    state: Mutex<RateLimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Create an unconfigured limiter. The first call with a non-zero rate
    /// starts with a full bucket.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RateLimiterState {
                tokens: 0.0,
                last_refill: Instant::now(),
                configured_rate: 0,
            }),
        }
    }

    /// Take one token, waiting as long as necessary.
    ///
    /// Returns immediately when `rate_per_minute` is 0 (unlimited).
    pub async fn acquire(&self, rate_per_minute: u32) {
        if rate_per_minute == 0 {
            return;
        }

        loop {
            let wait_time = self.try_take(rate_per_minute).await;
            if wait_time.is_zero() {
                return;
            }

            debug!(
                rate_per_minute,
                wait_ms = wait_time.as_millis() as u64,
                "Rate limit reached, waiting for a token"
            );
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Attempt to take a token without waiting.
    ///
    /// Returns `Duration::ZERO` if successful, otherwise the time until one
    /// token will have accumulated.
    async fn try_take(&self, rate: u32) -> Duration {
        let mut state = self.state.lock().await;
        state.refill(rate, Instant::now());

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Duration::ZERO;
        }

        let ms_per_token = MS_PER_MINUTE / rate as f64;
        let wait_ms = ((1.0 - state.tokens) * ms_per_token).ceil().max(1.0);
        Duration::from_millis(wait_ms as u64)
    }

    /// Tokens currently available at `rate_per_minute` (for testing/monitoring).
    ///
    /// Note: like [`acquire`](Self::acquire), this refills the bucket and
    /// reconfigures it when the rate differs.
    pub async fn available(&self, rate_per_minute: u32) -> f64 {
        if rate_per_minute == 0 {
            return f64::INFINITY;
        }
        let mut state = self.state.lock().await;
        state.refill(rate_per_minute, Instant::now());
        state.tokens
    }
}

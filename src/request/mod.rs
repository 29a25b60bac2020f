// ABOUTME: Request module - retry controller and single logical request executor.
// ABOUTME: Combines rate limiting, concurrency gating, per-attempt timeouts and backoff.

mod executor;
mod retry;

pub use executor::{Completion, RequestExecutor, RequestMeta};
pub use retry::{
    AttemptFailure, MAX_BACKOFF_MS, backoff_delay, compute_retry_delay, is_retryable_status,
};

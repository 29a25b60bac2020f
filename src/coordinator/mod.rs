// ABOUTME: Coordinator module for throttling provider traffic.
// ABOUTME: Contains the token-bucket rate limiter and the FIFO concurrency gate.

mod gate;
mod rate_limiter;

pub use gate::{ConcurrencyGate, GatePermit};
pub use rate_limiter::RateLimiter;

#[cfg(test)]
mod rate_limiter_test;

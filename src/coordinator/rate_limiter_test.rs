// ABOUTME: Tests for the token bucket rate limiter.
// ABOUTME: Covers bursts, throttling, refill, reconfiguration and the unlimited rate.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::rate_limiter::RateLimiter;

#[tokio::test(start_paused = true)]
async fn test_first_call_starts_with_full_bucket() {
    let limiter = RateLimiter::new();
    let available = limiter.available(10).await;
    assert!(
        (available - 10.0).abs() < 0.01,
        "Expected ~10 tokens, got {}",
        available
    );
}

#[tokio::test(start_paused = true)]
async fn test_calls_up_to_rate_never_sleep() {
    let limiter = RateLimiter::new();

    let start = Instant::now();
    for _ in 0..5 {
        limiter.acquire(5).await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_call_past_rate_waits() {
    let limiter = RateLimiter::new();
    for _ in 0..5 {
        limiter.acquire(5).await;
    }

    let start = Instant::now();
    limiter.acquire(5).await;
    let waited = start.elapsed();

    // One token every 12s at 5/min.
    assert!(waited > Duration::ZERO, "Sixth call should wait");
    assert!(
        waited >= Duration::from_secs(11) && waited <= Duration::from_secs(13),
        "Expected ~12s wait, waited {:?}",
        waited
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_rate_is_unlimited() {
    let limiter = RateLimiter::new();

    let start = Instant::now();
    for _ in 0..1000 {
        limiter.acquire(0).await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_refill_caps_at_rate() {
    let limiter = RateLimiter::new();
    limiter.acquire(3).await;

    tokio::time::sleep(Duration::from_secs(600)).await;

    let available = limiter.available(3).await;
    assert!(
        (available - 3.0).abs() < 0.01,
        "Expected ~3 tokens (capacity), got {}",
        available
    );
}

#[tokio::test(start_paused = true)]
async fn test_refill_is_proportional_to_elapsed_time() {
    let limiter = RateLimiter::new();
    for _ in 0..60 {
        limiter.acquire(60).await;
    }

    tokio::time::sleep(Duration::from_secs(10)).await;

    let available = limiter.available(60).await;
    assert!(
        (available - 10.0).abs() < 0.01,
        "Expected ~10 tokens after 10s at 60/min, got {}",
        available
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_change_refills_bucket() {
    let limiter = RateLimiter::new();
    for _ in 0..2 {
        limiter.acquire(2).await;
    }
    assert!(limiter.available(2).await < 0.01);

    // Raising the rate resets to a full bucket at the new capacity.
    let available = limiter.available(4).await;
    assert!(
        (available - 4.0).abs() < 0.01,
        "Expected full bucket of 4, got {}",
        available
    );

    let start = Instant::now();
    for _ in 0..4 {
        limiter.acquire(4).await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_acquires_all_complete() {
    let limiter = Arc::new(RateLimiter::new());
    let mut handles = Vec::new();

    for _ in 0..6 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire(3).await;
        }));
    }

    let start = Instant::now();
    for handle in handles {
        handle.await.unwrap();
    }

    // Three go immediately, the other three need a refill at 3/min.
    assert!(
        start.elapsed() >= Duration::from_secs(20),
        "Excess calls should have been throttled, took {:?}",
        start.elapsed()
    );
}

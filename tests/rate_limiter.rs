use std::sync::Arc;
use std::time::Duration;

use sec_edgar_client::rate_limit::RateLimiter;

#[tokio::test(start_paused = true)]
async fn test_first_acquire_does_not_wait() {
    let limiter = RateLimiter::new(2.0).unwrap();
    assert_eq!(limiter.acquire().await, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_acquires_are_spaced() {
    let limiter = RateLimiter::new(10.0).unwrap();
    let start = tokio::time::Instant::now();

    for _ in 0..5 {
        limiter.acquire().await;
    }

    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_tasks_share_one_budget() {
    let limiter = Arc::new(RateLimiter::new(10.0).unwrap());
    let start = tokio::time::Instant::now();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.acquire().await;
                tokio::time::Instant::now()
            })
        })
        .collect();

    let mut grants = Vec::new();
    for handle in handles {
        grants.push(handle.await.unwrap());
    }
    grants.sort();

    assert!(start.elapsed() >= Duration::from_millis(900));
    for pair in grants.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(100));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_across_threads() {
    let limiter = Arc::new(RateLimiter::new(20.0).unwrap());
    let start = std::time::Instant::now();

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        })
        .collect();

    let waits = futures_util::future::join_all(tasks).await;
    let zero_waits = waits
        .into_iter()
        .map(|w| w.unwrap())
        .filter(|w| w.is_zero())
        .count();

    // Five gaps of 50ms each.
    assert!(start.elapsed() >= Duration::from_millis(245));
    assert!(zero_waits >= 1);
}

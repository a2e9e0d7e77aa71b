#![cfg(feature = "test-utils")]

use std::time::{Duration, Instant};

use newsloom_ratelimit::RateLimiter;

#[tokio::test]
async fn allows_burst_up_to_capacity_then_throttles() {
    let (_c, cache) = newsloom_ratelimit::testutil::redis_container().await;
    let limiter = RateLimiter::new(cache, "2/sec").expect("valid rate spec");

    // Capacity starts full: first two waits should return near-instantly.
    let start = Instant::now();
    limiter.wait("example.com").await.expect("wait 1");
    limiter.wait("example.com").await.expect("wait 2");
    assert!(start.elapsed() < Duration::from_millis(500));

    // Third call exceeds capacity and must wait for a refill.
    let start = Instant::now();
    limiter.wait("example.com").await.expect("wait 3");
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn domains_are_independent() {
    let (_c, cache) = newsloom_ratelimit::testutil::redis_container().await;
    let limiter = RateLimiter::new(cache, "1/sec").expect("valid rate spec");

    limiter.wait("a.example.com").await.expect("a");
    assert!(limiter.allow("b.example.com").await.expect("b should be independent"));
}

#[tokio::test]
async fn record_error_backs_off_and_reset_clears_it() {
    let (_c, cache) = newsloom_ratelimit::testutil::redis_container().await;
    let limiter = RateLimiter::new(cache, "100/sec").expect("valid rate spec");

    limiter
        .record_error("slow.example.com", Some(429), Some(Duration::from_millis(300)))
        .await
        .expect("record error");

    assert!(!limiter.allow("slow.example.com").await.expect("should be backed off"));

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(limiter.allow("slow.example.com").await.expect("backoff expired"));

    // A plain non-2xx (not 429/403) is a per-item failure, not a
    // domain-wide rate-limit signal: it must not arm backoff at all, so a
    // single bad item can't stall every other fetch against the host.
    limiter
        .record_error("other.example.com", Some(500), None)
        .await
        .expect("record error without retry-after");
    assert!(limiter.allow("other.example.com").await.expect("non-429/403 status never backs off"));

    // Same for a transport-level failure with no status at all.
    limiter
        .record_error("other.example.com", None, None)
        .await
        .expect("record error with no status");
    assert!(limiter.allow("other.example.com").await.expect("network failure never backs off"));
}

#[tokio::test]
async fn wait_content_adds_jitter_after_an_immediate_take() {
    let (_c, cache) = newsloom_ratelimit::testutil::redis_container().await;
    let limiter = RateLimiter::new(cache, "100/sec").expect("valid rate spec");

    // Capacity is wide open, so `wait` returns effectively instantly.
    let start = Instant::now();
    limiter.wait("plain.example.com").await.expect("wait");
    assert!(start.elapsed() < Duration::from_millis(500));

    // `wait_content` takes the same uncontended token but must still add
    // the 1-3s post-take jitter before returning.
    let start = Instant::now();
    limiter.wait_content("content.example.com").await.expect("wait_content");
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn rejects_empty_host() {
    let (_c, cache) = newsloom_ratelimit::testutil::redis_container().await;
    let limiter = RateLimiter::new(cache, "10/sec").expect("valid rate spec");
    assert!(limiter.wait("").await.is_err());
}

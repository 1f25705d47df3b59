//! Per-platform token bucket.
//!
//! Each call refills the bucket by whole intervals elapsed, then takes one
//! token. An empty bucket makes the caller sleep for exactly one refill
//! interval and then proceed; the wait is not repeated, so a burst far beyond
//! capacity is slowed down but never queued indefinitely.
//!
//! The refill timestamp only moves when at least one whole token was earned,
//! unlike the textbook variant that stamps it on every call. Stamping on every
//! call would discard partial intervals, so callers arriving faster than the
//! interval would never see a refill.
//!
//! Buckets live in process memory only and are created on first use per key.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_CAPACITY: u32 = 20;
pub const DEFAULT_REFILL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    capacity: u32,
    last_refill: Instant,
    refill_interval: Duration,
}

impl Bucket {
    fn new(capacity: u32, refill_interval: Duration, now: Instant) -> Self {
        Self {
            tokens: capacity,
            capacity,
            last_refill: now,
            // a zero interval would divide by zero below
            refill_interval: refill_interval.max(Duration::from_millis(1)),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_millis() / self.refill_interval.as_millis();
        if earned > 0 {
            let earned = u32::try_from(earned).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(earned).min(self.capacity);
            self.last_refill = now;
        }
    }
}

/// Read-only view of a bucket, mostly for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSnapshot {
    pub tokens: u32,
    pub capacity: u32,
    pub refill_interval: Duration,
}

#[derive(Debug)]
pub struct Throttle {
    capacity: u32,
    refill_interval: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_REFILL_INTERVAL)
    }
}

impl Throttle {
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one token from `key`'s bucket using this throttle's defaults.
    pub async fn acquire(&self, key: &str) {
        self.acquire_with(key, self.capacity, self.refill_interval)
            .await
    }

    /// Takes one token from `key`'s bucket. `capacity` and `refill_interval`
    /// only apply when the bucket is created.
    pub async fn acquire_with(&self, key: &str, capacity: u32, refill_interval: Duration) {
        let wait = {
            let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let bucket = buckets
                .entry(key.to_string())
                .or_insert_with(|| Bucket::new(capacity, refill_interval, now));
            bucket.refill(now);
            (bucket.tokens == 0).then_some(bucket.refill_interval)
        };

        // Lock is released before sleeping so other keys are never blocked.
        if let Some(interval) = wait {
            debug!("Throttle '{key}' empty, waiting {}ms", interval.as_millis());
            tokio::time::sleep(interval).await;
        }

        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get_mut(key) {
            bucket.tokens = bucket.tokens.saturating_sub(1);
        }
    }

    pub fn snapshot(&self, key: &str) -> Option<BucketSnapshot> {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.get(key).map(|b| BucketSnapshot {
            tokens: b.tokens,
            capacity: b.capacity,
            refill_interval: b.refill_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: Duration = Duration::from_millis(1000);

    async fn timed(throttle: &Throttle, key: &str, capacity: u32) -> Duration {
        let start = Instant::now();
        throttle.acquire_with(key, capacity, R).await;
        start.elapsed()
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_calls_do_not_wait() {
        let throttle = Throttle::default();
        for _ in 0..5 {
            assert_eq!(timed(&throttle, "lever", 5).await, Duration::ZERO);
        }
        assert_eq!(throttle.snapshot("lever").unwrap().tokens, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_past_capacity_waits_one_interval() {
        let throttle = Throttle::default();
        for _ in 0..3 {
            timed(&throttle, "workday", 3).await;
        }
        let waited = timed(&throttle, "workday", 3).await;
        assert!(waited >= Duration::from_millis(900), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1100), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_greenhouse_third_call_waits() {
        let throttle = Throttle::default();
        let start = Instant::now();
        throttle.acquire_with("greenhouse", 2, R).await;
        throttle.acquire_with("greenhouse", 2, R).await;
        assert!(start.elapsed() < Duration::from_millis(10));
        throttle.acquire_with("greenhouse", 2, R).await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_after_interval_removes_wait() {
        let throttle = Throttle::default();
        for _ in 0..3 {
            timed(&throttle, "indeed", 2).await;
        }
        tokio::time::sleep(R).await;
        assert_eq!(timed(&throttle, "indeed", 2).await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_single_and_does_not_loop() {
        let throttle = Throttle::default();
        timed(&throttle, "linkedin", 1).await;
        // Both calls find an empty bucket; each waits once and proceeds.
        let first = timed(&throttle, "linkedin", 1).await;
        let second = timed(&throttle, "linkedin", 1).await;
        assert!(first >= Duration::from_millis(900), "waited {first:?}");
        assert!(second < Duration::from_millis(1100), "waited {second:?}");
        assert_eq!(throttle.snapshot("linkedin").unwrap().tokens, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_intervals_accumulate_across_calls() {
        let throttle = Throttle::default();
        timed(&throttle, "workday", 3).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        timed(&throttle, "workday", 3).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        timed(&throttle, "workday", 3).await;
        // 1200ms since creation earned one token despite the call in between.
        assert_eq!(throttle.snapshot("workday").unwrap().tokens, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped_at_capacity() {
        let throttle = Throttle::default();
        timed(&throttle, "lever", 4).await;
        tokio::time::sleep(R * 50).await;
        timed(&throttle, "lever", 4).await;
        assert_eq!(throttle.snapshot("lever").unwrap().tokens, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let throttle = Throttle::default();
        timed(&throttle, "greenhouse", 1).await;
        assert_eq!(timed(&throttle, "lever", 1).await, Duration::ZERO);
        assert!(throttle.snapshot("workday").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bucket_parameters_fixed_at_creation() {
        let throttle = Throttle::new(20, R);
        throttle.acquire("greenhouse").await;
        throttle.acquire_with("greenhouse", 2, R).await;
        let snapshot = throttle.snapshot("greenhouse").unwrap();
        assert_eq!(snapshot.capacity, 20);
        assert_eq!(snapshot.tokens, 18);
    }
}

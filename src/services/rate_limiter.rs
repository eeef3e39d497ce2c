//! Sliding-window request rate limiter
//!
//! Bounds outbound request rate over a rolling window. One instance is
//! shared (behind an `Arc`) by every code path that talks to the
//! exchange, so the window stays a single global gate.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::warn;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window rate limiter over the trailing 60 seconds.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize) -> Self {
        Self::with_window(max_requests, WINDOW)
    }

    /// Window override for tests; production code uses `new`.
    pub fn with_window(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Block until a request slot is free, then claim it.
    ///
    /// Prunes entries older than the window, and while at capacity
    /// sleeps until the oldest entry exits, re-evaluating after each
    /// wake so entries expiring mid-wait are observed. The new request
    /// timestamp is recorded before returning.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock();
                let now = Instant::now();
                while timestamps
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    timestamps.pop_front();
                }

                if timestamps.len() < self.max_requests {
                    timestamps.push_back(now);
                    return;
                }

                let Some(oldest) = timestamps.front().copied() else {
                    timestamps.push_back(now);
                    return;
                };
                self.window
                    .saturating_sub(now.duration_since(oldest))
                    .max(Duration::from_millis(1))
            };

            warn!(
                wait_secs = wait.as_secs_f64(),
                "request window at capacity, waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests currently inside the window (expired entries excluded).
    pub fn in_flight(&self) -> usize {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        while timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            timestamps.pop_front();
        }
        timestamps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_under_capacity_does_not_block() {
        let limiter = RateLimiter::with_window(5, Duration::from_millis(500));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(limiter.in_flight(), 5);
    }

    #[tokio::test]
    async fn test_excess_request_is_delayed_not_dropped() {
        let limiter = RateLimiter::with_window(3, Duration::from_millis(300));
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // The fourth call had to wait for the oldest entry to expire.
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(limiter.in_flight(), 4 - 3);
    }

    #[tokio::test]
    async fn test_window_prunes_expired_entries() {
        let limiter = RateLimiter::with_window(2, Duration::from_millis(100));
        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(limiter.in_flight(), 0);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_shared_gate_across_tasks() {
        let limiter = Arc::new(RateLimiter::with_window(2, Duration::from_millis(200)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.expect("acquire task panicked");
        }

        // Four acquisitions through a two-slot window need at least one
        // full window rollover.
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}

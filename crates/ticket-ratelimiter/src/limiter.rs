use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::RateLimiterConfig;

/// Snapshot returned by [`SlidingWindowRateLimiter::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStatus {
    pub limit: usize,
    pub window_seconds: u64,
    pub current_requests: usize,
    pub remaining: usize,
}

struct SlidingLog {
    request_log: VecDeque<Instant>,
}

impl SlidingLog {
    fn new() -> Self {
        Self {
            request_log: VecDeque::new(),
        }
    }

    /// Evicts entries older than `now - window`, then admits if the
    /// remaining queue has room. Returns `Some(0)` if admitted, or
    /// `Some(wait)` with how long the caller must wait before retrying.
    fn try_acquire(&mut self, now: Instant, config: &RateLimiterConfig) -> Duration {
        while let Some(&oldest) = self.request_log.front() {
            if now.duration_since(oldest) >= config.window {
                self.request_log.pop_front();
            } else {
                break;
            }
        }

        if self.request_log.len() < config.limit_for_period {
            self.request_log.push_back(now);
            Duration::ZERO
        } else {
            let oldest = *self.request_log.front().expect("non-empty: at capacity");
            let elapsed = now.duration_since(oldest);
            config.window.saturating_sub(elapsed)
        }
    }

    fn status(&self, now: Instant, config: &RateLimiterConfig) -> RateLimiterStatus {
        let current = self
            .request_log
            .iter()
            .filter(|&&ts| now.duration_since(ts) < config.window)
            .count();
        RateLimiterStatus {
            limit: config.limit_for_period,
            window_seconds: config.window.as_secs(),
            current_requests: current,
            remaining: config.limit_for_period.saturating_sub(current),
        }
    }
}

/// Process-global sliding-window rate limiter: admits a call iff fewer than
/// `limit_for_period` calls occurred in the last `window`.
///
/// A single process-wide instance is meant to be shared (behind an `Arc`)
/// across every tenant's outbound calls; fairness across concurrent callers
/// is best-effort, determined by lock-acquisition order.
pub struct SlidingWindowRateLimiter {
    state: Mutex<SlidingLog>,
    config: RateLimiterConfig,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            state: Mutex::new(SlidingLog::new()),
            config,
        }
    }

    /// Attempts to admit one call now. Returns `Duration::ZERO` if admitted,
    /// otherwise how long the caller must wait before trying again.
    pub async fn acquire(&self) -> Duration {
        let mut state = self.state.lock().await;
        let wait = state.try_acquire(Instant::now(), &self.config);

        #[cfg(feature = "tracing")]
        if wait.is_zero() {
            tracing::debug!(limiter = %self.config.name, "permit acquired");
        } else {
            tracing::debug!(limiter = %self.config.name, wait_ms = wait.as_millis() as u64, "permit rejected");
        }
        #[cfg(feature = "metrics")]
        {
            let outcome = if wait.is_zero() { "acquired" } else { "rejected" };
            metrics::counter!("ticket_ratelimiter_permits_total", "outcome" => outcome).increment(1);
        }

        wait
    }

    /// Loops `acquire` + sleep until admitted. A re-acquire after each sleep
    /// is required: concurrent callers may have filled the window while we
    /// slept.
    pub async fn wait_and_acquire(&self) {
        loop {
            let wait = self.acquire().await;
            if wait.is_zero() {
                return;
            }
            tokio::time::sleep(wait).await;
        }
    }

    pub async fn status(&self) -> RateLimiterStatus {
        let state = self.state.lock().await;
        state.status(Instant::now(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(limit: usize, window: Duration) -> RateLimiterConfig {
        RateLimiterConfig::builder()
            .limit_for_period(limit)
            .window(window)
            .build()
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_reports_wait() {
        let limiter = SlidingWindowRateLimiter::new(config(3, Duration::from_secs(60)));
        for _ in 0..3 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
        let wait = limiter.acquire().await;
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn status_reflects_current_usage() {
        let limiter = SlidingWindowRateLimiter::new(config(5, Duration::from_secs(60)));
        limiter.acquire().await;
        limiter.acquire().await;
        let status = limiter.status().await;
        assert_eq!(status.limit, 5);
        assert_eq!(status.current_requests, 2);
        assert_eq!(status.remaining, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_frees_capacity_after_window_elapses() {
        let limiter = SlidingWindowRateLimiter::new(config(1, Duration::from_secs(10)));
        assert_eq!(limiter.acquire().await, Duration::ZERO);
        assert!(limiter.acquire().await > Duration::ZERO);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_and_acquire_eventually_succeeds() {
        let limiter = SlidingWindowRateLimiter::new(config(1, Duration::from_secs(5)));
        limiter.acquire().await;
        // wait_and_acquire must sleep past the window rather than busy-spin.
        limiter.wait_and_acquire().await;
    }

    #[tokio::test]
    async fn concurrent_callers_never_exceed_the_limit() {
        use std::sync::Arc;

        let limiter = Arc::new(SlidingWindowRateLimiter::new(config(10, Duration::from_secs(60))));
        let mut handles = Vec::new();
        for _ in 0..25 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_zero() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }
}

use std::time::Duration;

/// Tuning knobs for a single coordinator instance. Unlike the rate limiter
/// and circuit breaker, there is exactly one sensible shape per deployment,
/// so this is a plain struct rather than a builder.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Attempts per page before a fetch failure aborts the run. A
    /// `RateLimited` response does not consume an attempt.
    pub max_fetch_attempts: u32,
    /// How many pages between proactive lock-lease refreshes.
    pub lock_refresh_every_n_pages: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_fetch_attempts: 3,
            lock_refresh_every_n_pages: 5,
        }
    }
}

/// Backoff applied between fetch attempts after a non-rate-limit failure:
/// `2^attempt` seconds, zero-indexed from the first retry.
pub fn fetch_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.saturating_sub(1)))
}

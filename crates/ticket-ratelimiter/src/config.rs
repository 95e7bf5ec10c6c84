use std::time::Duration;

/// Configuration for a [`crate::SlidingWindowRateLimiter`].
///
/// # Examples
///
/// ```
/// use ticket_ratelimiter::RateLimiterConfig;
/// use std::time::Duration;
///
/// let config = RateLimiterConfig::builder()
///     .limit_for_period(60)
///     .window(Duration::from_secs(60))
///     .name("external-api")
///     .build();
/// assert_eq!(config.limit_for_period, 60);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub limit_for_period: usize,
    pub window: Duration,
    pub name: String,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_for_period: 60,
            window: Duration::from_secs(60),
            name: "<unnamed>".to_string(),
        }
    }
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct RateLimiterConfigBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterConfigBuilder {
    /// Maximum number of admitted calls per rolling window. Default 60.
    pub fn limit_for_period(mut self, limit: usize) -> Self {
        self.config.limit_for_period = limit;
        self
    }

    /// Width of the rolling window. Default 60s.
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Name used in logs and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        self.config
    }
}

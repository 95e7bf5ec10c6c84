use std::time::Duration;

/// Configuration for a [`crate::CircuitBreaker`].
///
/// ```
/// use ticket_circuitbreaker::CircuitBreakerConfig;
/// use std::time::Duration;
///
/// let config = CircuitBreakerConfig::builder()
///     .failure_threshold(5)
///     .cool_down(Duration::from_secs(30))
///     .name("notify")
///     .build();
/// assert_eq!(config.failure_threshold, 5);
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cool_down: Duration,
    pub name: String,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            name: "<unnamed>".to_string(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Consecutive failures in `Closed` before tripping to `Open`. Default 5.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// How long `Open` rejects calls before allowing a `HalfOpen` probe. Default 30s.
    pub fn cool_down(mut self, cool_down: Duration) -> Self {
        self.config.cool_down = cool_down;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        self.config
    }
}

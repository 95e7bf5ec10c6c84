use std::time::Duration;

/// Configuration for a [`crate::NotifierService`].
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Jitter is uniform in `[0, jitter_fraction * delay)`.
    pub jitter_fraction: f64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter_fraction: 0.3,
        }
    }
}

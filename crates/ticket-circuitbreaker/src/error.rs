use std::time::Duration;

use thiserror::Error;

/// Returned by [`crate::CircuitBreaker::try_acquire`] when the circuit is
/// open (or half-open with a probe already in flight).
#[derive(Debug, Clone, Error)]
#[error("circuit breaker '{name}' is open, retry after {retry_after:?}")]
pub struct CircuitBreakerOpenError {
    pub name: String,
    pub retry_after: Duration,
}

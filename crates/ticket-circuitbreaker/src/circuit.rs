use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::CircuitBreakerConfig;
use crate::error::CircuitBreakerOpenError;

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

/// Point-in-time snapshot returned by [`CircuitBreaker::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStatus {
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<Instant>,
}

struct Inner {
    failure_count: u32,
    opened_at: Option<Instant>,
    /// `true` once the single half-open probe has been handed out, so a
    /// second concurrent caller is rejected rather than also probing.
    half_open_probe_in_flight: bool,
}

/// A three-state (closed/open/half-open) failure gate for one named
/// endpoint. Cheap to clone: wraps its mutable state in an `Arc`.
///
/// ```
/// use ticket_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cb = CircuitBreaker::new(CircuitBreakerConfig::builder().failure_threshold(2).name("notify").build());
/// assert!(cb.try_acquire().await.is_ok());
/// cb.record_failure().await;
/// cb.record_failure().await;
/// assert_eq!(cb.status().await.state, CircuitState::Open);
/// assert!(cb.try_acquire().await.is_err());
/// # }
/// ```
#[derive(Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<AtomicU8>,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
            inner: Arc::new(Mutex::new(Inner {
                failure_count: 0,
                opened_at: None,
                half_open_probe_in_flight: false,
            })),
        }
    }

    /// Lock-free peek at the current state, useful for metrics/logging
    /// without awaiting the inner mutex.
    pub fn current_state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `Ok(())` if the call may proceed, or the open error carrying
    /// `retry_after` otherwise. In `Open`, automatically transitions to
    /// `HalfOpen` once `cool_down` has elapsed and permits exactly one probe.
    pub async fn try_acquire(&self) -> Result<(), CircuitBreakerOpenError> {
        let mut inner = self.inner.lock().await;
        match self.current_state() {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("open implies opened_at set");
                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.cool_down {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.half_open_probe_in_flight = true;
                    Ok(())
                } else {
                    Err(CircuitBreakerOpenError {
                        name: self.config.name.clone(),
                        retry_after: self.config.cool_down - elapsed,
                    })
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_probe_in_flight {
                    let opened_at = inner.opened_at.unwrap_or_else(Instant::now);
                    Err(CircuitBreakerOpenError {
                        name: self.config.name.clone(),
                        retry_after: self.config.cool_down.saturating_sub(opened_at.elapsed()),
                    })
                } else {
                    inner.half_open_probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match self.current_state() {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Open => {}
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match self.current_state() {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        self.transition(&mut inner, CircuitState::Closed);
    }

    pub async fn status(&self) -> CircuitBreakerStatus {
        let inner = self.inner.lock().await;
        CircuitBreakerStatus {
            state: self.current_state(),
            failure_count: inner.failure_count,
            opened_at: inner.opened_at,
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        inner.failure_count = 0;
        inner.half_open_probe_in_flight = false;
        inner.opened_at = if to == CircuitState::Open {
            Some(Instant::now())
        } else {
            None
        };
        self.state.store(to as u8, Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.config.name, state = ?to, "circuit breaker transition");
        #[cfg(feature = "metrics")]
        metrics::counter!("ticket_circuitbreaker_transitions_total", "breaker" => self.config.name.clone(), "to" => format!("{to:?}")).increment(1);
    }
}

impl std::fmt::Debug for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        write!(f, "{s}")
    }
}

//! Per-named-endpoint circuit breaker: closed/open/half-open.
//!
//! Defaults match production experience with the notify endpoint: trip
//! after 5 consecutive failures, cool down for 30s, then allow exactly one
//! half-open probe before deciding whether to close or reopen.
//!
//! ```
//! use ticket_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
//! if cb.try_acquire().await.is_ok() {
//!     // make the call, then report the outcome:
//!     cb.record_success().await;
//! }
//! # }
//! ```

mod circuit;
mod config;
mod error;
mod registry;

pub use circuit::{CircuitBreaker, CircuitBreakerStatus, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerOpenError;
pub use registry::CircuitBreakerRegistry;

//! Fire-and-forget, circuit-gated notification sender with
//! exponential-backoff-and-jitter retries.
//!
//! ```no_run
//! use ticket_notifier::{NotificationPayload, NotifierService};
//! use ticket_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use ticket_core::Urgency;
//! # use ticket_notifier::{NotificationTransport, TransportError};
//! # use async_trait::async_trait;
//! # struct NoopTransport;
//! # #[async_trait]
//! # impl NotificationTransport for NoopTransport {
//! #     async fn send(&self, _: &NotificationPayload) -> Result<(), TransportError> { Ok(()) }
//! # }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::builder().name("notify").build());
//! let notifier = NotifierService::new(std::sync::Arc::new(NoopTransport), breaker);
//! notifier.send_notification(NotificationPayload {
//!     ticket_id: "E1".to_string(),
//!     tenant_id: "T1".to_string(),
//!     urgency: Urgency::High,
//!     reason: "new high-urgency ticket".to_string(),
//! });
//! # }
//! ```

mod config;
mod service;
mod transport;

pub use config::NotifierConfig;
pub use service::NotifierService;
pub use transport::{NotificationPayload, NotificationTransport, TransportError};

//! The ingestion coordinator: one job per tenant at a time, paginated
//! fetch-classify-sync-notify, cancellation, and deletion reconciliation.
//!
//! ```no_run
//! use ticket_ingest::{IngestionCoordinator, Page, TicketSource, source::SourceError};
//! use ticket_core::InMemoryStore;
//! use ticket_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
//! use ticket_notifier::{NotificationPayload, NotificationTransport, NotifierService, TransportError};
//! use ticket_ratelimiter::{RateLimiterConfig, SlidingWindowRateLimiter};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct EmptySource;
//! #[async_trait]
//! impl TicketSource for EmptySource {
//!     async fn fetch_page(&self, _tenant_id: &str, _page: u32) -> Result<Option<Page>, SourceError> {
//!         Ok(None)
//!     }
//! }
//!
//! struct NoopTransport;
//! #[async_trait]
//! impl NotificationTransport for NoopTransport {
//!     async fn send(&self, _: &NotificationPayload) -> Result<(), TransportError> { Ok(()) }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(RateLimiterConfig::default()));
//! let registry = CircuitBreakerRegistry::new();
//! let breaker = registry.get_or_create("notify", CircuitBreakerConfig::default()).await;
//! let notifier = Arc::new(NotifierService::new(Arc::new(NoopTransport), breaker));
//! let coordinator = IngestionCoordinator::new(store, Arc::new(EmptySource), rate_limiter, notifier);
//! let result = coordinator.run_ingestion("tenant-a").await.unwrap();
//! println!("{:?}", result.status);
//! # }
//! ```

mod config;
mod coordinator;
mod error;
pub mod source;

pub use config::IngestConfig;
pub use coordinator::{IngestionCoordinator, IngestionResult, IngestionStatus};
pub use error::IngestError;
pub use source::{Page, TicketSource};

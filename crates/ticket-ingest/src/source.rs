//! The `TicketSource` trait: the abstraction boundary standing in for the
//! out-of-scope outbound paginated ticket API.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use ticket_sync::IncomingTicket;

/// One page of a tenant's ticket enumeration.
#[derive(Debug, Clone)]
pub struct Page {
    pub tickets: Vec<IncomingTicket>,
    pub total_pages: u32,
}

#[derive(Debug, Error, Clone)]
pub enum SourceError {
    /// The source asked us to back off; `retry_after` does not count
    /// against the fetch attempt budget.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("source returned HTTP {0}")]
    Http(u16),
    #[error("source transport error: {0}")]
    Transport(String),
}

/// An `Ok(None)` page means the source has no more data for this tenant;
/// the coordinator treats it identically to exhausting `total_pages`.
#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn fetch_page(&self, tenant_id: &str, page: u32) -> Result<Option<Page>, SourceError>;
}

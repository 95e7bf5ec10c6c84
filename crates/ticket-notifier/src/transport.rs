use async_trait::async_trait;
use thiserror::Error;
use ticket_core::{TenantId, Urgency};

/// Payload for a high-urgency-ticket notification.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub ticket_id: String,
    pub tenant_id: TenantId,
    pub urgency: Urgency,
    pub reason: String,
}

/// Failure from the outbound notification call. Non-2xx is modeled as
/// `Status`; anything that never got an HTTP response (timeout, DNS,
/// connection refused) as `Transport`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("notification endpoint returned status {0}")]
    Status(u16),
    #[error("notification transport error: {0}")]
    Transport(String),
}

/// Sends a single notification attempt. A production implementation wraps
/// an HTTP client with a 10s request timeout; this crate treats the
/// transport as an out-of-scope collaborator and only defines the contract.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), TransportError>;
}

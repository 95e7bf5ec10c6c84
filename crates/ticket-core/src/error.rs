//! Error type returned by [`crate::DocumentStore`] implementations.

use thiserror::Error;

/// Failure surfaced by a [`crate::DocumentStore`] implementation.
///
/// This is intentionally coarse: the store is an out-of-scope collaborator,
/// so the contract only distinguishes the handful of outcomes callers in
/// this crate need to branch on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document not found")]
    NotFound,

    /// A write was rejected by a uniqueness constraint (e.g. a duplicate
    /// `(tenant_id, external_id)` or an already-held lock's unique
    /// `resource_id`).
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Any other backend failure (connection loss, serialization error,
    /// timeout). Opaque by design; a concrete store maps its own driver
    /// errors into this variant.
    #[error("store backend error: {0}")]
    Backend(String),
}

//! The coordinator's boundary error taxonomy.
//!
//! Per-ticket failures (a single bad record, a transient store hiccup on
//! one upsert) are swallowed and counted, never raised here — this enum
//! only carries failures that abort an entire run.

use thiserror::Error;
use ticket_circuitbreaker::CircuitBreakerOpenError;
use ticket_core::StoreError;

use crate::source::SourceError;

#[derive(Debug, Error, Clone)]
pub enum IngestError {
    #[error("resource not found")]
    NotFound,
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("upstream dependency degraded: {0}")]
    DependencyDegraded(String),
    #[error("performance limit exceeded: {0}")]
    PerformanceLimit(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => IngestError::NotFound,
            StoreError::Conflict(msg) => IngestError::Conflict(msg),
            StoreError::Backend(msg) => IngestError::Internal(msg),
        }
    }
}

impl From<CircuitBreakerOpenError> for IngestError {
    fn from(err: CircuitBreakerOpenError) -> Self {
        IngestError::DependencyDegraded(err.to_string())
    }
}

impl From<SourceError> for IngestError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::RateLimited { .. } => IngestError::PerformanceLimit(err.to_string()),
            SourceError::Http(_) | SourceError::Transport(_) => {
                IngestError::DependencyDegraded(err.to_string())
            }
        }
    }
}

//! Shared domain types, error taxonomy and document-store contract for the
//! support-ticket ingestion platform.
//!
//! This crate has no opinion on HTTP, wire formats or a concrete database —
//! those are out of scope collaborators. It defines the data the other
//! crates in this workspace operate on and the [`DocumentStore`] trait they
//! operate it through.

pub mod error;
pub mod model;
pub mod store;

#[cfg(feature = "test-util")]
pub mod memory;

pub use error::StoreError;
pub use model::*;
pub use store::{DocumentStore, UpsertOutcome};

#[cfg(feature = "test-util")]
pub use memory::InMemoryStore;

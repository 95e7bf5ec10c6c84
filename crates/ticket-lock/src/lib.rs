//! Distributed lock: an atomic, TTL-bounded lease over a named resource
//! backed by a [`DocumentStore`].
//!
//! Ownership is not guaranteed across TTL expiry — a holder that does not
//! [`LockService::refresh`] in time may have its lease stolen by another
//! process. This is a deliberate tradeoff (see the ingestion coordinator's
//! five-page refresh cadence), not a bug.
//!
//! ```no_run
//! use ticket_lock::LockService;
//! use ticket_core::InMemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let locks = LockService::new(store);
//! if locks.acquire("ingest:tenant-a", "job-123").await.unwrap() {
//!     // do exclusive work, periodically locks.refresh(...)
//!     locks.release("ingest:tenant-a", "job-123").await.unwrap();
//! }
//! # }
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use ticket_core::{DistributedLockRecord, DocumentStore, StoreError};

/// Default lease length: long-running holders must refresh before this
/// elapses or risk losing exclusivity.
pub const DEFAULT_TTL_SECONDS: i64 = 60;

pub struct LockService {
    store: Arc<dyn DocumentStore>,
    ttl: Duration,
}

impl LockService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_ttl(store, Duration::seconds(DEFAULT_TTL_SECONDS))
    }

    pub fn with_ttl(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Atomically steals an expired lock or inserts a fresh one. Returns
    /// `false` (not an error) when a live lock is already held by someone
    /// else.
    pub async fn acquire(&self, resource_id: &str, owner_id: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let acquired = self
            .store
            .try_steal_or_insert_lock(resource_id, owner_id, now, self.ttl)
            .await?;

        #[cfg(feature = "tracing")]
        if acquired {
            tracing::debug!(resource_id, owner_id, "lock acquired");
        } else {
            tracing::debug!(resource_id, owner_id, "lock acquisition failed: held by another owner");
        }

        Ok(acquired)
    }

    /// Only the owner may release; a lost-ownership release (after TTL
    /// expiry and theft) is a benign no-op that returns `false`.
    pub async fn release(&self, resource_id: &str, owner_id: &str) -> Result<bool, StoreError> {
        let released = self.store.delete_lock_if_owned(resource_id, owner_id).await?;

        #[cfg(feature = "tracing")]
        if !released {
            tracing::warn!(resource_id, owner_id, "lock release failed: ownership lost");
        }

        Ok(released)
    }

    /// Bumps `expires_at` by the configured TTL if still owned. Long-running
    /// holders must call this before expiry.
    pub async fn refresh(&self, resource_id: &str, owner_id: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        self.store
            .refresh_lock_if_owned(resource_id, owner_id, now, self.ttl)
            .await
    }

    pub async fn get_lock_status(
        &self,
        resource_id: &str,
    ) -> Result<Option<DistributedLockRecord>, StoreError> {
        self.store.get_lock(resource_id).await
    }

    /// Best-effort janitor sweep; correctness never depends on calling this,
    /// since `acquire` already steals expired locks inline.
    pub async fn cleanup_expired_locks(&self) -> Result<u64, StoreError> {
        self.store.cleanup_expired_locks(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_core::InMemoryStore;

    fn service() -> LockService {
        LockService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn second_acquire_fails_while_first_is_live() {
        let locks = service();
        assert!(locks.acquire("r1", "a").await.unwrap());
        assert!(!locks.acquire("r1", "b").await.unwrap());
    }

    #[tokio::test]
    async fn release_by_non_owner_is_a_no_op() {
        let locks = service();
        locks.acquire("r1", "a").await.unwrap();
        assert!(!locks.release("r1", "b").await.unwrap());
        assert!(locks.release("r1", "a").await.unwrap());
    }

    #[tokio::test]
    async fn lock_steal_after_expiry_then_original_release_fails() {
        let locks = LockService::with_ttl(Arc::new(InMemoryStore::new()), Duration::seconds(-1));
        assert!(locks.acquire("r1", "a").await.unwrap());
        // TTL already negative: lease is immediately expired.
        assert!(locks.acquire("r1", "b").await.unwrap());
        assert!(!locks.release("r1", "a").await.unwrap());
        assert!(locks.release("r1", "b").await.unwrap());
    }

    #[tokio::test]
    async fn refresh_extends_only_for_the_owner() {
        let locks = service();
        locks.acquire("r1", "a").await.unwrap();
        assert!(locks.refresh("r1", "a").await.unwrap());
        assert!(!locks.refresh("r1", "b").await.unwrap());
    }

    #[tokio::test]
    async fn get_lock_status_reports_current_owner() {
        let locks = service();
        assert!(locks.get_lock_status("r1").await.unwrap().is_none());
        locks.acquire("r1", "a").await.unwrap();
        let status = locks.get_lock_status("r1").await.unwrap().unwrap();
        assert_eq!(status.owner_id, "a");
    }
}

//! The `DocumentStore` trait: the abstraction boundary standing in for the
//! out-of-scope concrete database.
//!
//! Every method mirrors one operation the original MongoDB-backed service
//! performed; a production implementation is expected to back these with
//! the indexes documented on each method. This crate ships only an
//! in-memory implementation, gated behind the `test-util` feature, for use
//! in this workspace's own test suites.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{
    DistributedLockRecord, IngestionJob, IngestionLogEntry, TenantId, TenantStats, Ticket,
    TicketHistoryEntry,
};

/// Result of an upsert, mirroring MongoDB's `upserted_id` / `modified_count`
/// distinction, which the coordinator needs to tell "new" from "changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Modified,
    Unchanged,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lookup by `(tenant_id, external_id)`. Requires a unique index on
    /// that pair.
    async fn find_ticket(
        &self,
        tenant_id: &str,
        external_id: &str,
    ) -> Result<Option<Ticket>, StoreError>;

    /// Idempotent upsert keyed on `(tenant_id, external_id)`.
    async fn upsert_ticket(&self, ticket: Ticket) -> Result<UpsertOutcome, StoreError>;

    /// Ids present for this tenant but absent from `observed_external_ids`,
    /// excluding already soft-deleted tickets. Backs deletion reconciliation
    /// after a full page enumeration; requires `(tenant_id, deleted_at)`.
    async fn find_tickets_missing_from(
        &self,
        tenant_id: &str,
        observed_external_ids: &HashSet<String>,
    ) -> Result<Vec<String>, StoreError>;

    /// Conditionally stamps `deleted_at` on tickets whose `deleted_at` is
    /// still absent. Returns the number actually updated.
    async fn mark_tickets_deleted(
        &self,
        tenant_id: &str,
        external_ids: &[String],
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn append_history(&self, entry: TicketHistoryEntry) -> Result<(), StoreError>;

    /// Newest-first, bounded by `limit`. Requires `(ticket_id, recorded_at desc)`.
    async fn fetch_history(
        &self,
        tenant_id: &str,
        ticket_id: &str,
        limit: usize,
    ) -> Result<Vec<TicketHistoryEntry>, StoreError>;

    /// Two-step atomic acquire: steal an expired lock via a conditional
    /// update, else insert relying on the unique `resource_id` index to
    /// reject a live lock. Returns `true` iff acquisition succeeded.
    async fn try_steal_or_insert_lock(
        &self,
        resource_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, StoreError>;

    /// Delete by `{resource_id, owner_id}`. Returns `true` iff a row was removed.
    async fn delete_lock_if_owned(
        &self,
        resource_id: &str,
        owner_id: &str,
    ) -> Result<bool, StoreError>;

    /// Conditional `expires_at` bump. Returns `true` iff matched.
    async fn refresh_lock_if_owned(
        &self,
        resource_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, StoreError>;

    async fn get_lock(&self, resource_id: &str) -> Result<Option<DistributedLockRecord>, StoreError>;

    /// Best-effort janitor sweep; never required for correctness.
    async fn cleanup_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn insert_job(&self, job: IngestionJob) -> Result<(), StoreError>;

    /// Full replace, matched by `job_id`.
    async fn update_job(&self, job: IngestionJob) -> Result<(), StoreError>;

    /// At most one running job per tenant is ever observable.
    async fn find_running_job(&self, tenant_id: &str) -> Result<Option<IngestionJob>, StoreError>;

    async fn get_job(&self, job_id: uuid::Uuid) -> Result<Option<IngestionJob>, StoreError>;

    async fn append_log_entry(&self, entry: IngestionLogEntry) -> Result<(), StoreError>;

    /// Single call producing all seven facets over
    /// `{tenant_id, deleted_at absent, created_at in [from, to]}`. A
    /// production store pushes this down into one server-side pipeline;
    /// this crate's in-memory implementation computes it in one pass for
    /// the same reason: avoid per-facet round trips.
    async fn aggregate_tenant_stats(
        &self,
        tenant_id: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TenantStats, StoreError>;
}

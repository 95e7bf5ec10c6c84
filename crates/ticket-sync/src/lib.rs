//! Change detection, soft-delete reconciliation and append-only ticket
//! history.
//!
//! `sync_ticket` never writes a "created" history record itself — the
//! caller (the ingestion coordinator) only knows a ticket is genuinely new
//! after the upsert confirms an insert, not a race with a concurrent
//! ingester for the same id.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ticket_core::{
    DocumentStore, FieldChange, HistoryAction, StoreError, Ticket, TicketHistoryEntry,
};

/// Fields an external source may change between observations.
const TRACKED_FIELDS: &[&str] = &["subject", "message", "status"];

/// A ticket as reported by the external source, before classification.
#[derive(Debug, Clone)]
pub struct IncomingTicket {
    pub external_id: String,
    pub source: String,
    pub customer_id: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub ticket_id: String,
    pub changes: Vec<String>,
}

pub struct SyncService {
    store: std::sync::Arc<dyn DocumentStore>,
}

impl SyncService {
    pub fn new(store: std::sync::Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Looks up the existing ticket by `(tenant_id, external_id)`; emits an
    /// "updated" history record when the source reports both a newer
    /// `updated_at` and an actual field diff.
    pub async fn sync_ticket(
        &self,
        tenant_id: &str,
        incoming: &IncomingTicket,
    ) -> Result<SyncOutcome, StoreError> {
        let existing = self.store.find_ticket(tenant_id, &incoming.external_id).await?;

        let Some(existing) = existing else {
            return Ok(SyncOutcome {
                action: SyncAction::Created,
                ticket_id: incoming.external_id.clone(),
                changes: Vec::new(),
            });
        };

        if incoming.updated_at <= existing.updated_at {
            return Ok(SyncOutcome {
                action: SyncAction::Unchanged,
                ticket_id: incoming.external_id.clone(),
                changes: Vec::new(),
            });
        }

        let diff = compute_changes(&existing, incoming);
        if diff.is_empty() {
            return Ok(SyncOutcome {
                action: SyncAction::Unchanged,
                ticket_id: incoming.external_id.clone(),
                changes: Vec::new(),
            });
        }

        let changed_fields: Vec<String> = diff.keys().cloned().collect();
        self.record_history(TicketHistoryEntry {
            ticket_id: incoming.external_id.clone(),
            tenant_id: tenant_id.to_string(),
            action: HistoryAction::Updated,
            changes: diff,
            recorded_at: Utc::now(),
        })
        .await?;

        Ok(SyncOutcome {
            action: SyncAction::Updated,
            ticket_id: incoming.external_id.clone(),
            changes: changed_fields,
        })
    }

    /// External ids present for this tenant but absent from a full
    /// enumeration. The caller must pass the complete observed set; a
    /// partial enumeration would wrongly mark live tickets deleted.
    pub async fn detect_deleted_tickets(
        &self,
        tenant_id: &str,
        observed_external_ids: &HashSet<String>,
    ) -> Result<Vec<String>, StoreError> {
        self.store
            .find_tickets_missing_from(tenant_id, observed_external_ids)
            .await
    }

    /// Soft-deletes the given ids (skipping any already deleted) and emits
    /// one "deleted" history record per id actually marked.
    pub async fn mark_deleted(
        &self,
        tenant_id: &str,
        external_ids: &[String],
    ) -> Result<u64, StoreError> {
        let now = Utc::now();
        let count = self
            .store
            .mark_tickets_deleted(tenant_id, external_ids, now)
            .await?;

        for external_id in external_ids {
            self.record_history(TicketHistoryEntry {
                ticket_id: external_id.clone(),
                tenant_id: tenant_id.to_string(),
                action: HistoryAction::Deleted,
                changes: HashMap::new(),
                recorded_at: now,
            })
            .await?;
        }

        #[cfg(feature = "tracing")]
        if count > 0 {
            tracing::info!(tenant_id, count, "tickets soft-deleted");
        }

        Ok(count)
    }

    pub async fn record_history(&self, entry: TicketHistoryEntry) -> Result<(), StoreError> {
        self.store.append_history(entry).await
    }

    pub async fn get_ticket_history(
        &self,
        tenant_id: &str,
        ticket_id: &str,
        limit: usize,
    ) -> Result<Vec<TicketHistoryEntry>, StoreError> {
        self.store.fetch_history(tenant_id, ticket_id, limit).await
    }
}

/// Field-level diff over `{subject, message, status}`. A field absent on
/// both sides is skipped entirely rather than reported as an empty change.
pub fn compute_changes(
    existing: &Ticket,
    incoming: &IncomingTicket,
) -> HashMap<String, FieldChange> {
    let mut changes = HashMap::new();
    for field in TRACKED_FIELDS {
        let (old, new) = match *field {
            "subject" => (&existing.subject, &incoming.subject),
            "message" => (&existing.message, &incoming.message),
            "status" => (&existing.status, &incoming.status),
            _ => unreachable!(),
        };
        if old != new {
            changes.insert(
                field.to_string(),
                FieldChange {
                    old: Some(old.clone()),
                    new: Some(new.clone()),
                },
            );
        }
    }
    changes
}

//! An in-memory [`DocumentStore`] used by this workspace's test suites.
//!
//! Not a production store: every collection lives behind one
//! [`tokio::sync::Mutex`], which is fine for unit and integration tests but
//! would serialize every concurrent caller in a real deployment.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    AtRiskCustomer, DistributedLockRecord, HourlyBucket, IngestionJob, IngestionLogEntry,
    TenantId, TenantStats, Ticket, TicketHistoryEntry, Urgency,
};
use crate::store::{DocumentStore, UpsertOutcome};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
    "are", "was", "were", "",
];

#[derive(Default)]
struct Inner {
    tickets: HashMap<(String, String), Ticket>,
    jobs: HashMap<Uuid, IngestionJob>,
    logs: Vec<IngestionLogEntry>,
    locks: HashMap<String, DistributedLockRecord>,
    history: Vec<TicketHistoryEntry>,
}

/// In-memory [`DocumentStore`] for tests. Construct with [`InMemoryStore::new`].
pub struct InMemoryStore {
    inner: tokio::sync::Mutex<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: tokio::sync::Mutex::new(Inner::default()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_ticket(
        &self,
        tenant_id: &str,
        external_id: &str,
    ) -> Result<Option<Ticket>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tickets
            .get(&(tenant_id.to_string(), external_id.to_string()))
            .cloned())
    }

    async fn upsert_ticket(&self, ticket: Ticket) -> Result<UpsertOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let key = (ticket.tenant_id.clone(), ticket.external_id.clone());
        match inner.tickets.get(&key) {
            None => {
                inner.tickets.insert(key, ticket);
                Ok(UpsertOutcome::Inserted)
            }
            Some(existing) => {
                if *existing == ticket {
                    Ok(UpsertOutcome::Unchanged)
                } else {
                    inner.tickets.insert(key, ticket);
                    Ok(UpsertOutcome::Modified)
                }
            }
        }
    }

    async fn find_tickets_missing_from(
        &self,
        tenant_id: &str,
        observed_external_ids: &HashSet<String>,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tickets
            .values()
            .filter(|t| {
                t.tenant_id == tenant_id
                    && t.deleted_at.is_none()
                    && !observed_external_ids.contains(&t.external_id)
            })
            .map(|t| t.external_id.clone())
            .collect())
    }

    async fn mark_tickets_deleted(
        &self,
        tenant_id: &str,
        external_ids: &[String],
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let ids: HashSet<&String> = external_ids.iter().collect();
        let mut count = 0u64;
        for ticket in inner.tickets.values_mut() {
            if ticket.tenant_id == tenant_id
                && ids.contains(&ticket.external_id)
                && ticket.deleted_at.is_none()
            {
                ticket.deleted_at = Some(deleted_at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn append_history(&self, entry: TicketHistoryEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.history.push(entry);
        Ok(())
    }

    async fn fetch_history(
        &self,
        tenant_id: &str,
        ticket_id: &str,
        limit: usize,
    ) -> Result<Vec<TicketHistoryEntry>, StoreError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<TicketHistoryEntry> = inner
            .history
            .iter()
            .filter(|h| h.tenant_id == tenant_id && h.ticket_id == ticket_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn try_steal_or_insert_lock(
        &self,
        resource_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.locks.get(resource_id) {
            Some(existing) if existing.expires_at > now => Ok(false),
            _ => {
                inner.locks.insert(
                    resource_id.to_string(),
                    DistributedLockRecord {
                        resource_id: resource_id.to_string(),
                        owner_id: owner_id.to_string(),
                        acquired_at: now,
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn delete_lock_if_owned(
        &self,
        resource_id: &str,
        owner_id: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.locks.get(resource_id) {
            Some(lock) if lock.owner_id == owner_id => {
                inner.locks.remove(resource_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn refresh_lock_if_owned(
        &self,
        resource_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.locks.get_mut(resource_id) {
            Some(lock) if lock.owner_id == owner_id => {
                lock.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_lock(
        &self,
        resource_id: &str,
    ) -> Result<Option<DistributedLockRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.locks.get(resource_id).cloned())
    }

    async fn cleanup_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.locks.len();
        inner.locks.retain(|_, lock| lock.expires_at > now);
        Ok((before - inner.locks.len()) as u64)
    }

    async fn insert_job(&self, job: IngestionJob) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.jobs.contains_key(&job.job_id) {
            return Err(StoreError::Conflict(format!(
                "job {} already exists",
                job.job_id
            )));
        }
        inner.jobs.insert(job.job_id, job);
        Ok(())
    }

    async fn update_job(&self, job: IngestionJob) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.jobs.insert(job.job_id, job);
        Ok(())
    }

    async fn find_running_job(&self, tenant_id: &str) -> Result<Option<IngestionJob>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .jobs
            .values()
            .find(|j| j.tenant_id == tenant_id && !j.status.is_terminal())
            .cloned())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<IngestionJob>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.jobs.get(&job_id).cloned())
    }

    async fn append_log_entry(&self, entry: IngestionLogEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.logs.push(entry);
        Ok(())
    }

    async fn aggregate_tenant_stats(
        &self,
        tenant_id: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TenantStats, StoreError> {
        let inner = self.inner.lock().await;
        let in_range: Vec<&Ticket> = inner
            .tickets
            .values()
            .filter(|t| {
                &t.tenant_id == tenant_id
                    && t.deleted_at.is_none()
                    && t.created_at >= from
                    && t.created_at <= to
            })
            .collect();

        let total = in_range.len() as u64;
        if total == 0 {
            return Ok(TenantStats::empty());
        }

        let mut by_status: HashMap<String, u64> = HashMap::new();
        let mut high_count = 0u64;
        let mut negative_count = 0u64;
        for ticket in &in_range {
            *by_status.entry(ticket.status.clone()).or_insert(0) += 1;
            if ticket.urgency == Urgency::High {
                high_count += 1;
            }
            if ticket.sentiment == crate::model::Sentiment::Negative {
                negative_count += 1;
            }
        }
        let urgency_high_ratio = round3(high_count as f64 / total as f64);
        let negative_sentiment_ratio = round3(negative_count as f64 / total as f64);

        let trend_since = Utc::now() - Duration::hours(24);
        let mut hour_counts: HashMap<String, u64> = HashMap::new();
        for ticket in in_range.iter().filter(|t| t.created_at >= trend_since) {
            let bucket = ticket.created_at.format("%Y-%m-%d %H:00:00").to_string();
            *hour_counts.entry(bucket).or_insert(0) += 1;
        }
        let mut hourly_trend: Vec<HourlyBucket> = hour_counts
            .into_iter()
            .map(|(hour, count)| HourlyBucket { hour, count })
            .collect();
        hourly_trend.sort_by(|a, b| a.hour.cmp(&b.hour));
        hourly_trend.truncate(24);

        let mut word_counts: HashMap<String, u64> = HashMap::new();
        for ticket in &in_range {
            for word in ticket.message.to_lowercase().split_whitespace() {
                if STOPWORDS.contains(&word) {
                    continue;
                }
                if word.len() < 4 || !word.chars().all(|c| c.is_ascii_lowercase()) {
                    continue;
                }
                *word_counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }
        let mut keyword_pairs: Vec<(String, u64)> = word_counts.into_iter().collect();
        keyword_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top_keywords: Vec<String> = keyword_pairs
            .into_iter()
            .take(10)
            .map(|(word, _)| word)
            .collect();

        let mut by_customer: HashMap<String, Vec<String>> = HashMap::new();
        for ticket in in_range.iter().filter(|t| t.urgency == Urgency::High) {
            by_customer
                .entry(ticket.customer_id.clone())
                .or_default()
                .push(ticket.external_id.clone());
        }
        let mut at_risk_customers: Vec<AtRiskCustomer> = by_customer
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(customer_id, external_ids)| AtRiskCustomer {
                customer_id,
                count: external_ids.len() as u64,
                external_ids,
            })
            .collect();
        at_risk_customers.sort_by(|a, b| b.count.cmp(&a.count));
        at_risk_customers.truncate(10);

        Ok(TenantStats {
            total,
            by_status,
            urgency_high_ratio,
            negative_sentiment_ratio,
            hourly_trend,
            top_keywords,
            at_risk_customers,
        })
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;

    fn ticket(tenant: &str, external_id: &str, urgency: Urgency) -> Ticket {
        let now = Utc::now();
        Ticket {
            tenant_id: tenant.to_string(),
            external_id: external_id.to_string(),
            source: "web".to_string(),
            customer_id: "cust-1".to_string(),
            subject: "subject".to_string(),
            message: "please help urgently".to_string(),
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
            urgency,
            sentiment: Sentiment::Neutral,
            requires_action: false,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn empty_tenant_yields_zero_stats() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let stats = store
            .aggregate_tenant_stats(&"T0".to_string(), now - Duration::days(60), now)
            .await
            .unwrap();
        assert_eq!(stats, TenantStats::empty());
    }

    #[tokio::test]
    async fn upsert_reports_inserted_then_unchanged() {
        let store = InMemoryStore::new();
        let t = ticket("T1", "E1", Urgency::Low);
        assert_eq!(
            store.upsert_ticket(t.clone()).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_ticket(t).await.unwrap(),
            UpsertOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn lock_steal_after_expiry() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        assert!(store
            .try_steal_or_insert_lock("ingest:T1", "owner-a", now - Duration::seconds(61), Duration::seconds(60))
            .await
            .unwrap());
        // owner-a's lease has already expired relative to `now`.
        assert!(store
            .try_steal_or_insert_lock("ingest:T1", "owner-b", now, Duration::seconds(60))
            .await
            .unwrap());
        assert!(!store
            .delete_lock_if_owned("ingest:T1", "owner-a")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn tenant_isolation_on_missing_tickets() {
        let store = InMemoryStore::new();
        store
            .upsert_ticket(ticket("T1", "E1", Urgency::Low))
            .await
            .unwrap();
        store
            .upsert_ticket(ticket("T2", "E1", Urgency::Low))
            .await
            .unwrap();
        let missing = store
            .find_tickets_missing_from("T1", &HashSet::new())
            .await
            .unwrap();
        assert_eq!(missing, vec!["E1".to_string()]);
    }
}

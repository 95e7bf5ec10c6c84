use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use ticket_classifier::classify;
use ticket_core::{
    DocumentStore, HistoryAction, IngestionJob, IngestionLogEntry, JobStatus, LogStatus,
    TicketHistoryEntry, Urgency, UpsertOutcome,
};
use ticket_lock::LockService;
use ticket_notifier::{NotificationPayload, NotifierService};
use ticket_ratelimiter::SlidingWindowRateLimiter;
use ticket_sync::{IncomingTicket, SyncAction, SyncService};

use crate::config::{fetch_backoff, IngestConfig};
use crate::error::IngestError;
use crate::source::{Page, TicketSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionStatus {
    AlreadyRunning,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    pub status: IngestionStatus,
    pub job_id: Uuid,
    pub new_ingested: u64,
    pub updated: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default)]
struct Counters {
    new_ingested: u64,
    updated: u64,
    errors: u64,
}

struct RunLoopFailure {
    error: IngestError,
    counters: Counters,
}

fn resource_id(tenant_id: &str) -> String {
    format!("ingest:{tenant_id}")
}

/// Orchestrates one tenant's ingestion run: lock, paginate, classify,
/// sync, notify, reconcile deletions, and record the outcome.
///
/// At most one run per tenant is permitted at a time; a second caller
/// observes [`IngestionStatus::AlreadyRunning`] rather than an error, since
/// losing the lock race is a normal outcome, not a failure.
pub struct IngestionCoordinator {
    store: Arc<dyn DocumentStore>,
    source: Arc<dyn TicketSource>,
    lock: LockService,
    sync: SyncService,
    rate_limiter: Arc<SlidingWindowRateLimiter>,
    notifier: Arc<NotifierService>,
    config: IngestConfig,
    cancellation_flags: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn TicketSource>,
        rate_limiter: Arc<SlidingWindowRateLimiter>,
        notifier: Arc<NotifierService>,
    ) -> Self {
        Self::with_config(store, source, rate_limiter, notifier, IngestConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn TicketSource>,
        rate_limiter: Arc<SlidingWindowRateLimiter>,
        notifier: Arc<NotifierService>,
        config: IngestConfig,
    ) -> Self {
        Self {
            lock: LockService::new(store.clone()),
            sync: SyncService::new(store.clone()),
            store,
            source,
            rate_limiter,
            notifier,
            config,
            cancellation_flags: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run_ingestion(&self, tenant_id: &str) -> Result<IngestionResult, IngestError> {
        let job_id = Uuid::new_v4();
        let owner_id = job_id.to_string();
        let resource = resource_id(tenant_id);

        if !self.lock.acquire(&resource, &owner_id).await? {
            let existing = self.store.find_running_job(tenant_id).await?;
            return Ok(IngestionResult {
                status: IngestionStatus::AlreadyRunning,
                job_id: existing.map(|j| j.job_id).unwrap_or(job_id),
                new_ingested: 0,
                updated: 0,
                errors: 0,
            });
        }

        let started_at = Utc::now();
        let mut job = IngestionJob::new(job_id, tenant_id.to_string(), started_at);
        self.store.insert_job(job.clone()).await?;

        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.cancellation_flags
            .lock()
            .await
            .insert(job_id, cancel_flag.clone());

        let run_result = self.run_loop(tenant_id, job_id, &mut job, &cancel_flag).await;

        self.cancellation_flags.lock().await.remove(&job_id);
        let _ = self.lock.release(&resource, &owner_id).await;

        let ended_at = Utc::now();
        match run_result {
            Ok(counters) => {
                let cancelled = cancel_flag.load(Ordering::SeqCst);
                job.status = if cancelled {
                    JobStatus::Cancelled
                } else {
                    JobStatus::Completed
                };
                job.ended_at = Some(ended_at);
                self.store.update_job(job).await?;

                let log_status = if counters.errors > 0 {
                    LogStatus::PartialSuccess
                } else {
                    LogStatus::Success
                };
                self.store
                    .append_log_entry(IngestionLogEntry {
                        tenant_id: tenant_id.to_string(),
                        job_id,
                        status: log_status,
                        started_at,
                        ended_at,
                        new_ingested: counters.new_ingested,
                        updated: counters.updated,
                        errors: counters.errors,
                        error_message: None,
                    })
                    .await?;

                Ok(IngestionResult {
                    status: if cancelled {
                        IngestionStatus::Cancelled
                    } else {
                        IngestionStatus::Completed
                    },
                    job_id,
                    new_ingested: counters.new_ingested,
                    updated: counters.updated,
                    errors: counters.errors,
                })
            }
            Err(failure) => {
                job.status = JobStatus::Failed;
                job.ended_at = Some(ended_at);
                // Best-effort: the run already failed, bookkeeping failures
                // here must not mask the original error.
                let _ = self.store.update_job(job).await;
                let _ = self
                    .store
                    .append_log_entry(IngestionLogEntry {
                        tenant_id: tenant_id.to_string(),
                        job_id,
                        status: LogStatus::Failed,
                        started_at,
                        ended_at,
                        new_ingested: failure.counters.new_ingested,
                        updated: failure.counters.updated,
                        errors: failure.counters.errors,
                        error_message: Some(failure.error.to_string()),
                    })
                    .await;

                #[cfg(feature = "tracing")]
                tracing::error!(tenant_id, %job_id, error = %failure.error, "ingestion run aborted");

                Err(failure.error)
            }
        }
    }

    /// Signals the running job to stop after its current page. Returns
    /// `false` if no job with this id is currently tracked.
    pub async fn cancel_job(&self, job_id: Uuid) -> bool {
        if let Some(flag) = self.cancellation_flags.lock().await.get(&job_id) {
            flag.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub async fn get_job_status(&self, job_id: Uuid) -> Result<Option<IngestionJob>, IngestError> {
        Ok(self.store.get_job(job_id).await?)
    }

    /// The currently running job for a tenant, if any.
    pub async fn get_ingestion_status(
        &self,
        tenant_id: &str,
    ) -> Result<Option<IngestionJob>, IngestError> {
        Ok(self.store.find_running_job(tenant_id).await?)
    }

    async fn run_loop(
        &self,
        tenant_id: &str,
        job_id: Uuid,
        job: &mut IngestionJob,
        cancel_flag: &Arc<AtomicBool>,
    ) -> Result<Counters, RunLoopFailure> {
        let mut counters = Counters::default();
        let mut observed_ids: HashSet<String> = HashSet::new();
        let mut page = 1u32;

        loop {
            if cancel_flag.load(Ordering::SeqCst) {
                break;
            }

            self.rate_limiter.wait_and_acquire().await;

            let page_data = match self.fetch_page_with_retry(tenant_id, page).await {
                Ok(Some(data)) => data,
                Ok(None) => break,
                Err(error) => return Err(RunLoopFailure { error, counters }),
            };

            job.total_pages = Some(page_data.total_pages);
            job.processed_pages = page;
            job.progress = progress_percent(page, page_data.total_pages);
            if let Err(err) = self.store.update_job(job.clone()).await {
                return Err(RunLoopFailure {
                    error: err.into(),
                    counters,
                });
            }

            for incoming in page_data.tickets {
                observed_ids.insert(incoming.external_id.clone());
                self.process_ticket(tenant_id, incoming, &mut counters).await;
            }

            if page % self.config.lock_refresh_every_n_pages == 0 {
                let _ = self.lock.refresh(&resource_id(tenant_id), &job_id.to_string()).await;
            }

            if page >= page_data.total_pages {
                break;
            }
            page += 1;
        }

        if !cancel_flag.load(Ordering::SeqCst) {
            let missing = self
                .sync
                .detect_deleted_tickets(tenant_id, &observed_ids)
                .await
                .map_err(|err| RunLoopFailure {
                    error: err.into(),
                    counters: counters.clone(),
                })?;
            if !missing.is_empty() {
                self.sync
                    .mark_deleted(tenant_id, &missing)
                    .await
                    .map_err(|err| RunLoopFailure {
                        error: err.into(),
                        counters: counters.clone(),
                    })?;
            }
        }

        Ok(counters)
    }

    /// Classifies, syncs, upserts and (for high-urgency results) notifies
    /// for a single record. Per-ticket failures are swallowed and counted;
    /// one bad record must never abort the whole page.
    async fn process_ticket(&self, tenant_id: &str, incoming: IncomingTicket, counters: &mut Counters) {
        let existing_deleted_at = self
            .store
            .find_ticket(tenant_id, &incoming.external_id)
            .await
            .ok()
            .flatten()
            .and_then(|t| t.deleted_at);

        let sync_outcome = match self.sync.sync_ticket(tenant_id, &incoming).await {
            Ok(outcome) => outcome,
            Err(_err) => {
                counters.errors += 1;
                return;
            }
        };
        if sync_outcome.action == SyncAction::Unchanged {
            return;
        }

        let classification = classify(&incoming.subject, &incoming.message);
        let ticket = ticket_core::Ticket {
            tenant_id: tenant_id.to_string(),
            external_id: incoming.external_id.clone(),
            source: incoming.source.clone(),
            customer_id: incoming.customer_id.clone(),
            subject: incoming.subject.clone(),
            message: incoming.message.clone(),
            status: incoming.status.clone(),
            created_at: incoming.created_at,
            updated_at: incoming.updated_at,
            urgency: classification.urgency,
            sentiment: classification.sentiment,
            requires_action: classification.requires_action,
            deleted_at: existing_deleted_at,
        };

        let outcome = match self.store.upsert_ticket(ticket).await {
            Ok(outcome) => outcome,
            Err(_err) => {
                counters.errors += 1;
                return;
            }
        };

        match outcome {
            UpsertOutcome::Inserted => {
                counters.new_ingested += 1;
                let _ = self
                    .sync
                    .record_history(TicketHistoryEntry {
                        ticket_id: incoming.external_id.clone(),
                        tenant_id: tenant_id.to_string(),
                        action: HistoryAction::Created,
                        changes: HashMap::new(),
                        recorded_at: Utc::now(),
                    })
                    .await;
            }
            UpsertOutcome::Modified => counters.updated += 1,
            UpsertOutcome::Unchanged => {}
        }

        if classification.urgency == Urgency::High {
            self.notifier.send_notification(NotificationPayload {
                ticket_id: incoming.external_id,
                tenant_id: tenant_id.to_string(),
                urgency: classification.urgency,
                reason: "high-urgency ticket ingested".to_string(),
            });
        }
    }

    /// Up to `max_fetch_attempts` attempts per page. A `RateLimited`
    /// response sleeps for the advertised duration and retries without
    /// consuming an attempt; any other error backs off exponentially and
    /// eventually aborts the run.
    async fn fetch_page_with_retry(&self, tenant_id: &str, page: u32) -> Result<Option<Page>, IngestError> {
        let mut attempt = 0u32;
        loop {
            match self.source.fetch_page(tenant_id, page).await {
                Ok(page_data) => return Ok(page_data),
                Err(crate::source::SourceError::RateLimited { retry_after }) => {
                    tokio::time::sleep(retry_after).await;
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.max_fetch_attempts {
                        return Err(err.into());
                    }
                    tokio::time::sleep(fetch_backoff(attempt)).await;
                }
            }
        }
    }
}

fn progress_percent(page: u32, total_pages: u32) -> u8 {
    if total_pages == 0 {
        return 100;
    }
    (((page as f64 / total_pages as f64) * 100.0).min(100.0)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use ticket_core::{InMemoryStore, StoreError};

    struct ScriptedSource {
        pages: Vec<Page>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TicketSource for ScriptedSource {
        async fn fetch_page(&self, _tenant_id: &str, page: u32) -> Result<Option<Page>, crate::source::SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.get((page - 1) as usize).cloned())
        }
    }

    fn incoming(external_id: &str) -> IncomingTicket {
        let now = Utc::now();
        IncomingTicket {
            external_id: external_id.to_string(),
            source: "web".to_string(),
            customer_id: "cust-1".to_string(),
            subject: "urgent: system down".to_string(),
            message: "our production system is completely broken".to_string(),
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn harness(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn TicketSource>,
    ) -> IngestionCoordinator {
        use ticket_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
        use ticket_notifier::NotificationTransport;
        use ticket_ratelimiter::RateLimiterConfig;

        struct NoopTransport;
        #[async_trait]
        impl NotificationTransport for NoopTransport {
            async fn send(
                &self,
                _payload: &NotificationPayload,
            ) -> Result<(), ticket_notifier::TransportError> {
                Ok(())
            }
        }

        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
            RateLimiterConfig::builder().limit_for_period(1000).window(Duration::from_secs(1)).build(),
        ));
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::builder().name("notify-test").build());
        let notifier = Arc::new(NotifierService::new(Arc::new(NoopTransport), breaker));
        IngestionCoordinator::new(store, source, rate_limiter, notifier)
    }

    #[tokio::test]
    async fn full_run_ingests_new_tickets_and_reports_completed() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let source = Arc::new(ScriptedSource {
            pages: vec![Page {
                tickets: vec![incoming("E1"), incoming("E2")],
                total_pages: 1,
            }],
            calls: AtomicUsize::new(0),
        });
        let coordinator = harness(store.clone(), source);

        let result = coordinator.run_ingestion("T1").await.unwrap();
        assert_eq!(result.status, IngestionStatus::Completed);
        assert_eq!(result.new_ingested, 2);
        assert_eq!(result.updated, 0);
        assert_eq!(result.errors, 0);

        let job = coordinator.get_job_status(result.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.processed_pages, 1);
    }

    #[tokio::test]
    async fn second_run_while_one_is_held_reports_already_running() {
        let store = Arc::new(InMemoryStore::new());
        let held_job_id = Uuid::new_v4();
        store
            .insert_job(IngestionJob::new(held_job_id, "T1".to_string(), Utc::now()))
            .await
            .unwrap();
        ticket_lock::LockService::new(store.clone())
            .acquire(&resource_id("T1"), &held_job_id.to_string())
            .await
            .unwrap();

        let source = Arc::new(ScriptedSource {
            pages: vec![],
            calls: AtomicUsize::new(0),
        });
        let coordinator = harness(store, source.clone());

        let result = coordinator.run_ingestion("T1").await.unwrap();
        assert_eq!(result.status, IngestionStatus::AlreadyRunning);
        assert_eq!(result.job_id, held_job_id);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deletion_reconciliation_marks_tickets_absent_from_the_enumeration() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let stale = ticket_core::Ticket {
            tenant_id: "T1".to_string(),
            external_id: "STALE".to_string(),
            source: "web".to_string(),
            customer_id: "cust-2".to_string(),
            subject: "old".to_string(),
            message: "old".to_string(),
            status: "open".to_string(),
            created_at: Utc::now() - ChronoDuration::days(5),
            updated_at: Utc::now() - ChronoDuration::days(5),
            urgency: ticket_core::Urgency::Low,
            sentiment: ticket_core::Sentiment::Neutral,
            requires_action: false,
            deleted_at: None,
        };
        store.upsert_ticket(stale).await.unwrap();

        let source = Arc::new(ScriptedSource {
            pages: vec![Page {
                tickets: vec![incoming("E1")],
                total_pages: 1,
            }],
            calls: AtomicUsize::new(0),
        });
        let coordinator = harness(store.clone(), source);
        coordinator.run_ingestion("T1").await.unwrap();

        let stale = store.find_ticket("T1", "STALE").await.unwrap().unwrap();
        assert!(stale.deleted_at.is_some());
    }

    #[tokio::test]
    async fn cancel_job_on_unknown_id_returns_false() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let source = Arc::new(ScriptedSource {
            pages: vec![],
            calls: AtomicUsize::new(0),
        });
        let coordinator = harness(store, source);
        assert!(!coordinator.cancel_job(Uuid::new_v4()).await);
    }

    struct FlakyStore {
        inner: InMemoryStore,
        fail_external_id: String,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn find_ticket(
            &self,
            tenant_id: &str,
            external_id: &str,
        ) -> Result<Option<ticket_core::Ticket>, StoreError> {
            self.inner.find_ticket(tenant_id, external_id).await
        }

        async fn upsert_ticket(&self, ticket: ticket_core::Ticket) -> Result<UpsertOutcome, StoreError> {
            if ticket.external_id == self.fail_external_id {
                return Err(StoreError::Backend("simulated write failure".to_string()));
            }
            self.inner.upsert_ticket(ticket).await
        }

        async fn find_tickets_missing_from(
            &self,
            tenant_id: &str,
            observed_external_ids: &HashSet<String>,
        ) -> Result<Vec<String>, StoreError> {
            self.inner.find_tickets_missing_from(tenant_id, observed_external_ids).await
        }

        async fn mark_tickets_deleted(
            &self,
            tenant_id: &str,
            external_ids: &[String],
            deleted_at: chrono::DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            self.inner.mark_tickets_deleted(tenant_id, external_ids, deleted_at).await
        }

        async fn append_history(&self, entry: TicketHistoryEntry) -> Result<(), StoreError> {
            self.inner.append_history(entry).await
        }

        async fn fetch_history(
            &self,
            tenant_id: &str,
            ticket_id: &str,
            limit: usize,
        ) -> Result<Vec<TicketHistoryEntry>, StoreError> {
            self.inner.fetch_history(tenant_id, ticket_id, limit).await
        }

        async fn try_steal_or_insert_lock(
            &self,
            resource_id: &str,
            owner_id: &str,
            now: chrono::DateTime<Utc>,
            ttl: chrono::Duration,
        ) -> Result<bool, StoreError> {
            self.inner.try_steal_or_insert_lock(resource_id, owner_id, now, ttl).await
        }

        async fn delete_lock_if_owned(&self, resource_id: &str, owner_id: &str) -> Result<bool, StoreError> {
            self.inner.delete_lock_if_owned(resource_id, owner_id).await
        }

        async fn refresh_lock_if_owned(
            &self,
            resource_id: &str,
            owner_id: &str,
            now: chrono::DateTime<Utc>,
            ttl: chrono::Duration,
        ) -> Result<bool, StoreError> {
            self.inner.refresh_lock_if_owned(resource_id, owner_id, now, ttl).await
        }

        async fn get_lock(
            &self,
            resource_id: &str,
        ) -> Result<Option<ticket_core::DistributedLockRecord>, StoreError> {
            self.inner.get_lock(resource_id).await
        }

        async fn cleanup_expired_locks(&self, now: chrono::DateTime<Utc>) -> Result<u64, StoreError> {
            self.inner.cleanup_expired_locks(now).await
        }

        async fn insert_job(&self, job: IngestionJob) -> Result<(), StoreError> {
            self.inner.insert_job(job).await
        }

        async fn update_job(&self, job: IngestionJob) -> Result<(), StoreError> {
            self.inner.update_job(job).await
        }

        async fn find_running_job(&self, tenant_id: &str) -> Result<Option<IngestionJob>, StoreError> {
            self.inner.find_running_job(tenant_id).await
        }

        async fn get_job(&self, job_id: Uuid) -> Result<Option<IngestionJob>, StoreError> {
            self.inner.get_job(job_id).await
        }

        async fn append_log_entry(&self, entry: IngestionLogEntry) -> Result<(), StoreError> {
            self.inner.append_log_entry(entry).await
        }

        async fn aggregate_tenant_stats(
            &self,
            tenant_id: &ticket_core::TenantId,
            from: chrono::DateTime<Utc>,
            to: chrono::DateTime<Utc>,
        ) -> Result<ticket_core::TenantStats, StoreError> {
            self.inner.aggregate_tenant_stats(tenant_id, from, to).await
        }
    }

    #[tokio::test]
    async fn a_failing_upsert_is_counted_and_does_not_abort_the_page() {
        let store: Arc<dyn DocumentStore> = Arc::new(FlakyStore {
            inner: InMemoryStore::new(),
            fail_external_id: "BAD".to_string(),
        });
        let source = Arc::new(ScriptedSource {
            pages: vec![Page {
                tickets: vec![incoming("BAD"), incoming("GOOD")],
                total_pages: 1,
            }],
            calls: AtomicUsize::new(0),
        });
        let coordinator = harness(store.clone(), source);

        let result = coordinator.run_ingestion("T1").await.unwrap();
        assert_eq!(result.status, IngestionStatus::Completed);
        assert_eq!(result.new_ingested, 1);
        assert_eq!(result.errors, 1);
        assert!(store.find_ticket("T1", "GOOD").await.unwrap().is_some());
        assert!(store.find_ticket("T1", "BAD").await.unwrap().is_none());
    }
}

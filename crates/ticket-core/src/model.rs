//! Domain types shared by every component: tickets, jobs, locks and history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A tenant is identified by an opaque string assigned by the caller.
pub type TenantId = String;

/// Server-generated, globally unique identifier for an ingestion run.
pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

/// The outcome of classifying a ticket's free-text subject and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub urgency: Urgency,
    pub sentiment: Sentiment,
    pub requires_action: bool,
}

/// Identity is `(tenant_id, external_id)`; this pair is globally unique.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticket {
    pub tenant_id: TenantId,
    pub external_id: String,
    pub source: String,
    pub customer_id: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub urgency: Urgency,
    pub sentiment: Sentiment,
    pub requires_action: bool,
    /// Presence means soft-deleted. Monotonic: never cleared once set.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JobStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// A single ingestion run for one tenant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngestionJob {
    pub job_id: JobId,
    pub tenant_id: TenantId,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_pages: Option<u32>,
    pub processed_pages: u32,
    pub progress: u8,
}

impl IngestionJob {
    pub fn new(job_id: JobId, tenant_id: TenantId, started_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            tenant_id,
            status: JobStatus::Running,
            started_at,
            ended_at: None,
            total_pages: None,
            processed_pages: 0,
            progress: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum LogStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Append-only record written exactly once per job termination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngestionLogEntry {
    pub tenant_id: TenantId,
    pub job_id: JobId,
    pub status: LogStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub new_ingested: u64,
    pub updated: u64,
    pub errors: u64,
    pub error_message: Option<String>,
}

/// A TTL-bounded exclusive lease over a named resource.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributedLockRecord {
    pub resource_id: String,
    pub owner_id: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

/// Old/new pair recorded for a single changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldChange {
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Append-only change record, ordered by `recorded_at` per ticket.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TicketHistoryEntry {
    pub ticket_id: String,
    pub tenant_id: TenantId,
    pub action: HistoryAction,
    pub changes: HashMap<String, FieldChange>,
    pub recorded_at: DateTime<Utc>,
}

/// A single hour-bucket point in the 24h trend facet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HourlyBucket {
    /// Formatted `YYYY-MM-DD HH:00:00`.
    pub hour: String,
    pub count: u64,
}

/// A customer with repeated high-urgency tickets in the window.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtRiskCustomer {
    pub customer_id: String,
    pub count: u64,
    pub external_ids: Vec<String>,
}

/// The seven-facet result of a single tenant-statistics aggregation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TenantStats {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
    pub urgency_high_ratio: f64,
    pub negative_sentiment_ratio: f64,
    pub hourly_trend: Vec<HourlyBucket>,
    pub top_keywords: Vec<String>,
    pub at_risk_customers: Vec<AtRiskCustomer>,
}

impl TenantStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            by_status: HashMap::new(),
            urgency_high_ratio: 0.0,
            negative_sentiment_ratio: 0.0,
            hourly_trend: Vec::new(),
            top_keywords: Vec::new(),
            at_risk_customers: Vec::new(),
        }
    }
}

//! Tenant statistics: a single store call producing all seven facets
//! (total, by-status, urgency, sentiment, hourly trend, top keywords,
//! at-risk customers) over one filtered window.
//!
//! This crate does not compute the facets itself — that is the
//! `DocumentStore`'s job, so a production store can push the whole
//! computation into one server-side pipeline stage. This crate only owns
//! the default date range and the call boundary.

use chrono::{DateTime, Duration, Utc};
use ticket_core::{DocumentStore, StoreError, TenantStats};

/// Default lookback window when the caller supplies no explicit range.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 60;

pub struct AnalyticsAggregator {
    store: std::sync::Arc<dyn DocumentStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: std::sync::Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// `to` defaults to now; `from` defaults to `to - 60 days`.
    pub async fn get_tenant_stats(
        &self,
        tenant_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<TenantStats, StoreError> {
        let to = to.unwrap_or_else(Utc::now);
        let from = from.unwrap_or(to - Duration::days(DEFAULT_LOOKBACK_DAYS));
        self.store
            .aggregate_tenant_stats(&tenant_id.to_string(), from, to)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_core::{InMemoryStore, Sentiment, Ticket, Urgency};

    fn ticket(tenant: &str, external_id: &str, customer: &str, urgency: Urgency) -> Ticket {
        let now = Utc::now();
        Ticket {
            tenant_id: tenant.to_string(),
            external_id: external_id.to_string(),
            source: "web".to_string(),
            customer_id: customer.to_string(),
            subject: "s".to_string(),
            message: "urgent refund please help immediately".to_string(),
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
            urgency,
            sentiment: Sentiment::Negative,
            requires_action: true,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn empty_tenant_returns_zero_shape() {
        let aggregator = AnalyticsAggregator::new(std::sync::Arc::new(InMemoryStore::new()));
        let stats = aggregator.get_tenant_stats("T0", None, None).await.unwrap();
        assert_eq!(stats, TenantStats::empty());
    }

    #[tokio::test]
    async fn at_risk_customers_require_at_least_two_high_urgency_tickets() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        store
            .upsert_ticket(ticket("T1", "E1", "cust-a", Urgency::High))
            .await
            .unwrap();
        store
            .upsert_ticket(ticket("T1", "E2", "cust-a", Urgency::High))
            .await
            .unwrap();
        store
            .upsert_ticket(ticket("T1", "E3", "cust-b", Urgency::High))
            .await
            .unwrap();

        let aggregator = AnalyticsAggregator::new(store);
        let stats = aggregator.get_tenant_stats("T1", None, None).await.unwrap();
        assert_eq!(stats.at_risk_customers.len(), 1);
        assert_eq!(stats.at_risk_customers[0].customer_id, "cust-a");
        assert_eq!(stats.urgency_high_ratio, 1.0);
        assert_eq!(stats.negative_sentiment_ratio, 1.0);
    }
}

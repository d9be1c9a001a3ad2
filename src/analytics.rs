//! Read-only accessor over the analytics event store.
//!
//! Exposes a single parameterized grouped-count query. The query is the
//! dominant latency source of a report request, so it carries its own longer
//! timeout. Failures are not retried here; retry policy belongs to callers.

use std::time::Duration;

use anyhow::anyhow;
use chrono::NaiveDate;
use tokio::time::timeout;

use crate::db::DbConn;
use crate::error::StatsError;
use crate::models::UsageRecord;

/// Event kind counted as one usage session.
pub const OPEN_ROUTE_DETAIL: &str = "open_route_detail";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct AnalyticsStore {
    db: DbConn,
    timeout: Duration,
}

impl AnalyticsStore {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Count qualifying events per route id over an inclusive date range.
    /// Returns one record per route id with at least one event; everything
    /// is passed as bound parameters, never interpolated.
    pub async fn run_aggregation(
        &self,
        event_name: &str,
        route_ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UsageRecord>, StatsError> {
        let query = self
            .db
            .query(
                "SELECT route_id, count() AS sessions FROM analytics_event \
                 WHERE event_name = $event_name \
                 AND route_id IN $route_ids \
                 AND event_date >= $start \
                 AND event_date <= $end \
                 GROUP BY route_id",
            )
            .bind(("event_name", event_name.to_string()))
            .bind(("route_ids", route_ids.to_vec()))
            .bind(("start", start.format("%Y-%m-%d").to_string()))
            .bind(("end", end.format("%Y-%m-%d").to_string()));

        let mut response = timeout(self.timeout, query)
            .await
            .map_err(|_| {
                StatsError::AggregationQueryFailed(anyhow!(
                    "aggregation query timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| StatsError::AggregationQueryFailed(e.into()))?;

        response
            .take(0)
            .map_err(|e| StatsError::AggregationQueryFailed(e.into()))
    }
}

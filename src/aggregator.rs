//! Usage aggregation: per-route session counts for a date range.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::analytics::{AnalyticsStore, OPEN_ROUTE_DETAIL};
use crate::error::StatsError;

/// Fetch session counts for the given route ids over `[start, end]`.
///
/// Exactly one store query per call. The result only holds ids with at
/// least one qualifying event; defaulting absent ids to zero is the
/// merger's job. An empty id set is a caller error, not a zero-result
/// success, and is rejected before any I/O, as is an inverted date range.
pub async fn aggregate_usage(
    store: &AnalyticsStore,
    route_ids: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, u64>, StatsError> {
    if route_ids.is_empty() {
        return Err(StatsError::NoRouteIds);
    }
    if start > end {
        return Err(StatsError::EmptyDateRange { start, end });
    }

    let records = store
        .run_aggregation(OPEN_ROUTE_DETAIL, route_ids, start, end)
        .await?;

    tracing::debug!(
        routes = route_ids.len(),
        counted = records.len(),
        %start,
        %end,
        "aggregated route sessions"
    );

    Ok(records
        .into_iter()
        .map(|r| (r.route_id, r.sessions))
        .collect())
}

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Category;

/// Error taxonomy for the reporting core.
///
/// Caller errors (`InvalidCategory`, `EmptyDateRange`, `NoRouteIds`) are
/// rejected before any store I/O. Upstream failures keep the underlying
/// diagnostic attached and are never retried here.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid category `{0}`, must be \"city\" or \"sponsor\"")]
    InvalidCategory(String),

    #[error("invalid date range: {start} is after {end}")]
    EmptyDateRange { start: NaiveDate, end: NaiveDate },

    #[error("no route ids to aggregate")]
    NoRouteIds,

    #[error("no routes recorded for {category} `{id}`")]
    NoRoutesForEntity { category: Category, id: String },

    #[error("no routes with transportation type `{0}`")]
    NoRoutesForType(String),

    #[error("document store query failed")]
    DocumentQueryFailed(#[source] anyhow::Error),

    #[error("aggregation query failed")]
    AggregationQueryFailed(#[source] anyhow::Error),
}

impl StatsError {
    /// Malformed request, fixable by the caller.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StatsError::InvalidCategory(_)
                | StatsError::EmptyDateRange { .. }
                | StatsError::NoRouteIds
        )
    }

    /// Negative lookup outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StatsError::NoRoutesForEntity { .. } | StatsError::NoRoutesForType(_)
        )
    }
}

//! REST handlers for the reporting API.
//!
//! Thin translation layer: parse/validate the request, call the shared
//! `ReportService`, map the error taxonomy onto status codes. Caller errors
//! are 400, negative outcomes 404, upstream failures 500.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::sync::Arc;

use super::service::ReportService;
use crate::error::StatsError;
use crate::models::{Category, EntityMatch, ReportRow, UsageRecord};

pub type AppState = Arc<ReportService>;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Deserialize)]
pub struct ByNameRequest {
    pub name: String,
    pub category: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize)]
pub struct ByTransportRequest {
    pub transport_type: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize)]
pub struct SuggestRequest {
    pub query: String,
    pub category: String,
}

#[derive(Deserialize)]
pub struct UsageQueryRequest {
    #[serde(default)]
    pub route_ids: Vec<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub routes: Vec<ReportRow>,
    pub truncated: bool,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub matches: Vec<EntityMatch>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(err: StatsError) -> ApiError {
    let status = if err.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    let details = err.source().map(|s| s.to_string());
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            details,
        }),
    )
}

fn not_found(message: String) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message,
            details: None,
        }),
    )
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid {field} `{value}`, expected YYYY-MM-DD"),
                details: None,
            }),
        )
    })
}

fn parse_category(value: &str) -> Result<Category, ApiError> {
    value.parse::<Category>().map_err(error_response)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/v1/reports/by-name
pub async fn report_by_name(
    State(service): State<AppState>,
    Json(req): Json<ByNameRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let category = parse_category(&req.category)?;
    let start = parse_date("start_date", &req.start_date)?;
    let end = parse_date("end_date", &req.end_date)?;

    match service.report_by_name(&req.name, category, start, end).await {
        Ok(Some(report)) => Ok(Json(ReportResponse {
            routes: report.rows,
            truncated: report.truncated,
        })),
        Ok(None) => Err(not_found(format!("{category} not found: {}", req.name))),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /api/v1/reports/by-transport
pub async fn report_by_transport(
    State(service): State<AppState>,
    Json(req): Json<ByTransportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let start = parse_date("start_date", &req.start_date)?;
    let end = parse_date("end_date", &req.end_date)?;

    match service
        .report_by_transport(&req.transport_type, start, end)
        .await
    {
        Ok(Some(report)) => Ok(Json(ReportResponse {
            routes: report.rows,
            truncated: report.truncated,
        })),
        Ok(None) => Err(not_found(format!(
            "no routes for transport type: {}",
            req.transport_type
        ))),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /api/v1/suggest
pub async fn suggest(
    State(service): State<AppState>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let category = parse_category(&req.category)?;
    match service.suggest(&req.query, category).await {
        Ok(matches) if matches.is_empty() => {
            Err(not_found(format!("{category} not found: {}", req.query)))
        }
        Ok(matches) => Ok(Json(SuggestResponse { matches })),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /api/v1/usage/query (diagnostic)
pub async fn query_usage(
    State(service): State<AppState>,
    Json(req): Json<UsageQueryRequest>,
) -> Result<Json<Vec<UsageRecord>>, ApiError> {
    let start = parse_date("start_date", &req.start_date)?;
    let end = parse_date("end_date", &req.end_date)?;

    match service.raw_usage(&req.route_ids, start, end).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => Err(error_response(e)),
    }
}

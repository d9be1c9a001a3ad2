//! Pure join of route metadata with usage counts into report rows.

use std::collections::HashMap;

use crate::models::{ReportRow, Route};

/// Derived display metric. The double floor (inner truncation before the
/// division by 100, then integer division) is observable output and must
/// not be simplified to a single rounding step.
pub fn trees_planted(sessions: u64, length_meters: f64) -> u64 {
    let inner = (sessions as f64 * (length_meters * 0.75 / 1000.0)).floor() as u64;
    inner / 100
}

/// Join routes with usage, one output row per input route in input order.
/// Routes absent from `usage` (including placeholders) report zero
/// sessions. Never fails: well-formed input always yields an output of
/// equal length.
pub fn merge(routes: &[Route], usage: &HashMap<String, u64>) -> Vec<ReportRow> {
    routes
        .iter()
        .map(|route| {
            let sessions = usage.get(&route.id).copied().unwrap_or(0);
            ReportRow {
                route_id: route.id.clone(),
                display_name: route.display_name.clone(),
                length_meters: route.length_meters,
                transportation_types: route.transportation_types.clone(),
                sessions,
                trees_planted: trees_planted(sessions, route.length_meters),
            }
        })
        .collect()
}

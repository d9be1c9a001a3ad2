//! Fuzzy resolution of free-text names to canonical entity ids.

use std::cmp::Ordering;

use crate::error::StatsError;
use crate::fuzzy;
use crate::models::{Category, EntityMatch};
use crate::store::CatalogStore;

/// Maximum normalized edit distance for a candidate to count as a match.
/// Tolerates minor misspellings and case differences, rejects unrelated
/// names.
pub const MATCH_THRESHOLD: f64 = 0.4;

/// Rank the category's entities against `query`, best match first.
///
/// An empty result means no match (the entity set may itself be empty);
/// that is a normal outcome, not an error.
pub async fn match_entities(
    store: &CatalogStore,
    query: &str,
    category: Category,
) -> Result<Vec<EntityMatch>, StatsError> {
    let candidates = store.entity_names(category).await?;
    let needle = query.trim().to_lowercase();

    let mut scored: Vec<(f64, EntityMatch)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let d = fuzzy::normalized_distance(&needle, &candidate.name.to_lowercase());
            (d <= MATCH_THRESHOLD).then_some((d, candidate))
        })
        .collect();

    // Ties broken by name, then id, so rankings are reproducible.
    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.name.cmp(&b.1.name))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    Ok(scored.into_iter().map(|(_, m)| m).collect())
}

//! Report orchestration: wires matcher, resolver, aggregator, and merger
//! per request, plus an optional read-through cache.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::aggregator;
use crate::analytics::AnalyticsStore;
use crate::error::StatsError;
use crate::matcher;
use crate::merger;
use crate::models::{Category, EntityMatch, ReportRow, UsageRecord};
use crate::resolver::{RouteResolver, RouteSelector};
use crate::store::CatalogStore;

/// Reserved name meaning "all routes, skip entity resolution".
pub const ALL_ROUTES_SENTINEL: &str = "all";

/// A finished report. `truncated` flags that the route batch exceeded the
/// aggregation cap, so rows past the cap carry zero sessions.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub truncated: bool,
}

/// Best-effort memoization over identical report requests. Purely an
/// optimization: a miss must produce the same result as a hit, so the
/// service works identically without it. Bounded: once the capacity is
/// reached the oldest entry is evicted, keeping long-running servers from
/// accumulating one entry per distinct request tuple forever.
pub struct ReportCache {
    entries: RwLock<CacheInner>,
}

struct CacheInner {
    map: HashMap<String, Report>,
    order: VecDeque<String>,
    capacity: usize,
}

const DEFAULT_CACHE_CAPACITY: usize = 256;

impl Default for ReportCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Report> {
        self.entries.read().await.map.get(key).cloned()
    }

    pub async fn put(&self, key: String, report: Report) {
        let mut inner = self.entries.write().await;
        if !inner.map.contains_key(&key) {
            if inner.order.len() >= inner.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
            inner.order.push_back(key.clone());
        }
        inner.map.insert(key, report);
    }
}

pub struct ReportService {
    catalog: CatalogStore,
    analytics: AnalyticsStore,
    resolver: RouteResolver,
    cache: Option<ReportCache>,
}

impl ReportService {
    pub fn new(catalog: CatalogStore, analytics: AnalyticsStore) -> Self {
        let resolver = RouteResolver::new(catalog.clone());
        Self {
            catalog,
            analytics,
            resolver,
            cache: None,
        }
    }

    pub fn with_route_cap(mut self, cap: usize) -> Self {
        self.resolver = RouteResolver::new(self.catalog.clone()).with_route_cap(cap);
        self
    }

    pub fn with_cache(mut self) -> Self {
        self.cache = Some(ReportCache::new());
        self
    }

    /// Report for a fuzzy city/sponsor name, or the full catalog when the
    /// name is the `"all"` sentinel. `Ok(None)` means nothing matched.
    pub async fn report_by_name(
        &self,
        name: &str,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Report>, StatsError> {
        if start > end {
            return Err(StatsError::EmptyDateRange { start, end });
        }

        // Key on the raw name: the sentinel check below is case-sensitive,
        // so normalizing here would fold "ALL" into a cached "all" report.
        let cache_key = format!("by-name:{category}:{name}:{start}:{end}");
        if let Some(cache) = &self.cache {
            if let Some(report) = cache.get(&cache_key).await {
                return Ok(Some(report));
            }
        }

        let selector = if name == ALL_ROUTES_SENTINEL {
            RouteSelector::All
        } else {
            let matches = matcher::match_entities(&self.catalog, name, category).await?;
            match matches.into_iter().next() {
                Some(top) => {
                    tracing::debug!(query = name, resolved = %top.name, id = %top.id, "matched entity");
                    RouteSelector::ByEntity {
                        category,
                        id: top.id,
                    }
                }
                None => return Ok(None),
            }
        };

        let report = self.build_report(&selector, start, end).await?;
        if let (Some(cache), Some(report)) = (&self.cache, &report) {
            cache.put(cache_key, report.clone()).await;
        }
        Ok(report)
    }

    /// Report over every route carrying the given transportation type.
    pub async fn report_by_transport(
        &self,
        transport_type: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Report>, StatsError> {
        if start > end {
            return Err(StatsError::EmptyDateRange { start, end });
        }
        let selector = RouteSelector::ByTransportType(transport_type.to_string());
        match self.build_report(&selector, start, end).await {
            Err(StatsError::NoRoutesForType(_)) => Ok(None),
            other => other,
        }
    }

    /// Ranked "did you mean" matches, best first. Empty means not found.
    pub async fn suggest(
        &self,
        query: &str,
        category: Category,
    ) -> Result<Vec<EntityMatch>, StatsError> {
        matcher::match_entities(&self.catalog, query, category).await
    }

    /// Diagnostic pass-through to the aggregator, bypassing route
    /// resolution. Output sorted by route id for reproducibility.
    pub async fn raw_usage(
        &self,
        route_ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UsageRecord>, StatsError> {
        let usage = aggregator::aggregate_usage(&self.analytics, route_ids, start, end).await?;
        let mut records: Vec<UsageRecord> = usage
            .into_iter()
            .map(|(route_id, sessions)| UsageRecord { route_id, sessions })
            .collect();
        records.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        Ok(records)
    }

    async fn build_report(
        &self,
        selector: &RouteSelector,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Report>, StatsError> {
        let resolved = self.resolver.resolve(selector).await?;
        if resolved.routes.is_empty() {
            // Only reachable for `All` against an empty catalog.
            return Ok(None);
        }
        let usage =
            aggregator::aggregate_usage(&self.analytics, &resolved.query_ids, start, end).await?;
        let rows = merger::merge(&resolved.routes, &usage);
        Ok(Some(Report {
            rows,
            truncated: resolved.truncated,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::OPEN_ROUTE_DETAIL;
    use crate::db::{self, DbConn};
    use crate::models::{AnalyticsEventDoc, CityDoc, LocalizedName, RouteDoc};

    async fn seeded_db() -> DbConn {
        let conn = db::connect_memory().await.unwrap();
        db::init_schema(&conn).await.unwrap();

        for (id, name, length, types) in [
            ("r-1", "Canal Walk", 4000.0, vec!["walk"]),
            ("r-2", "Old Town Loop", 2500.0, vec!["walk", "bike"]),
        ] {
            let _: Option<RouteDoc> = conn
                .create("route")
                .content(RouteDoc {
                    route_id: id.to_string(),
                    name: Some(LocalizedName::english(name)),
                    length: Some(length),
                    transportation: Some(types.into_iter().map(String::from).collect()),
                })
                .await
                .unwrap();
        }

        let _: Option<CityDoc> = conn
            .create("city")
            .content(CityDoc {
                city_id: "c-paris".to_string(),
                name: Some(LocalizedName::english("Paris")),
                route_ids: vec!["r-1".to_string(), "r-2".to_string()],
            })
            .await
            .unwrap();

        // 200 sessions on r-1, 3 on r-2, all inside 2024
        for _ in 0..200 {
            let _: Option<AnalyticsEventDoc> = conn
                .create("analytics_event")
                .content(AnalyticsEventDoc {
                    event_name: OPEN_ROUTE_DETAIL.to_string(),
                    route_id: "r-1".to_string(),
                    event_date: "2024-05-10".to_string(),
                })
                .await
                .unwrap();
        }
        for _ in 0..3 {
            let _: Option<AnalyticsEventDoc> = conn
                .create("analytics_event")
                .content(AnalyticsEventDoc {
                    event_name: OPEN_ROUTE_DETAIL.to_string(),
                    route_id: "r-2".to_string(),
                    event_date: "2024-06-01".to_string(),
                })
                .await
                .unwrap();
        }

        conn
    }

    fn service(conn: &DbConn) -> ReportService {
        ReportService::new(
            CatalogStore::new(conn.clone()),
            AnalyticsStore::new(conn.clone()),
        )
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn fuzzy_name_resolves_to_full_report() {
        let conn = seeded_db().await;
        let report = service(&conn)
            .report_by_name("Pariss", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert!(!report.truncated);
        assert_eq!(report.rows[0].route_id, "r-1");
        assert_eq!(report.rows[0].sessions, 200);
        assert_eq!(report.rows[0].trees_planted, 6);
        assert_eq!(report.rows[1].sessions, 3);
    }

    #[tokio::test]
    async fn all_sentinel_skips_entity_resolution() {
        let conn = seeded_db().await;
        // Category contents are irrelevant for the sentinel.
        let report = service(&conn)
            .report_by_name("all", Category::Sponsor, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.rows.len(), 2);
    }

    #[tokio::test]
    async fn unmatched_name_is_not_found() {
        let conn = seeded_db().await;
        let report = service(&conn)
            .report_by_name("Zzzqx", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn inverted_range_rejected_before_lookup() {
        let conn = seeded_db().await;
        let err = service(&conn)
            .report_by_name("Paris", Category::City, date("2024-12-31"), date("2024-01-01"))
            .await
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[tokio::test]
    async fn identical_requests_yield_identical_reports() {
        let conn = seeded_db().await;
        let svc = service(&conn);
        let a = svc
            .report_by_name("Paris", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        let b = svc
            .report_by_name("Paris", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[tokio::test]
    async fn cache_hit_equals_cache_miss() {
        let conn = seeded_db().await;
        let uncached = service(&conn);
        let cached = service(&conn).with_cache();

        let baseline = uncached
            .report_by_name("Paris", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        let miss = cached
            .report_by_name("Paris", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        let hit = cached
            .report_by_name("Paris", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert_eq!(baseline, miss);
        assert_eq!(miss, hit);
    }

    #[tokio::test]
    async fn uppercase_all_is_not_the_sentinel_even_when_cached() {
        let conn = seeded_db().await;
        let svc = service(&conn).with_cache();

        // Prime the cache with the real sentinel.
        let catalog = svc
            .report_by_name("all", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert!(catalog.is_some());

        // "ALL" is an ordinary (unmatchable) name, cached or not.
        let mixed_case = svc
            .report_by_name("ALL", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert!(mixed_case.is_none());

        let uncached = service(&conn)
            .report_by_name("ALL", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert_eq!(mixed_case, uncached);
    }

    #[tokio::test]
    async fn cache_evicts_oldest_entry_at_capacity() {
        let report = |n: u64| Report {
            rows: vec![],
            truncated: n % 2 == 0,
        };
        let cache = ReportCache::with_capacity(2);
        cache.put("a".to_string(), report(1)).await;
        cache.put("b".to_string(), report(2)).await;
        cache.put("c".to_string(), report(3)).await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());

        // Re-putting an existing key must not evict anything.
        cache.put("b".to_string(), report(4)).await;
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn transport_report_covers_matching_routes_only() {
        let conn = seeded_db().await;
        let report = service(&conn)
            .report_by_transport("bike", date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].route_id, "r-2");

        let missing = service(&conn)
            .report_by_transport("gondola", date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn truncated_report_is_flagged_and_zero_fills_excess_routes() {
        let conn = seeded_db().await;
        let svc = service(&conn).with_route_cap(1);
        let report = svc
            .report_by_name("all", Category::City, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap()
            .unwrap();
        assert!(report.truncated);
        assert_eq!(report.rows.len(), 2);
        // r-2 fell past the cap: metadata present, sessions zeroed
        assert_eq!(report.rows[1].route_id, "r-2");
        assert_eq!(report.rows[1].sessions, 0);
    }

    #[tokio::test]
    async fn raw_usage_is_sorted_and_skips_empty_routes() {
        let conn = seeded_db().await;
        let ids = vec!["r-2".to_string(), "r-1".to_string(), "r-none".to_string()];
        let records = service(&conn)
            .raw_usage(&ids, date("2024-01-01"), date("2024-12-31"))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].route_id, "r-1");
        assert_eq!(records[0].sessions, 200);
        assert_eq!(records[1].route_id, "r-2");
    }
}

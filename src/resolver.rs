//! Route resolution: selector to concrete route metadata plus the id list
//! fed to the usage aggregator.

use crate::error::StatsError;
use crate::models::{Category, Route};
use crate::store::CatalogStore;

/// Default cap on the route-id batch handed to the analytics store; keeps
/// the aggregation query bounded when resolving the full catalog.
pub const DEFAULT_ROUTE_CAP: usize = 1000;

/// Per-batch bound on concurrent route-metadata lookups.
const LOOKUP_FANOUT: usize = 32;

/// Which routes a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSelector {
    /// Routes owned by one canonical entity.
    ByEntity { category: Category, id: String },
    /// Every route in the store.
    All,
    /// Routes whose transportation types contain the given type.
    ByTransportType(String),
}

/// Resolver output. `query_ids` is the (possibly capped) id list for the
/// aggregator; `routes` always covers the full resolution in input-id
/// order. When `truncated` is set, routes past the cap get no usage data
/// and report zero sessions.
#[derive(Debug, Clone)]
pub struct ResolvedRoutes {
    pub routes: Vec<Route>,
    pub query_ids: Vec<String>,
    pub truncated: bool,
}

#[derive(Clone)]
pub struct RouteResolver {
    store: CatalogStore,
    route_cap: usize,
}

impl RouteResolver {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store,
            route_cap: DEFAULT_ROUTE_CAP,
        }
    }

    pub fn with_route_cap(mut self, cap: usize) -> Self {
        self.route_cap = cap;
        self
    }

    pub async fn resolve(&self, selector: &RouteSelector) -> Result<ResolvedRoutes, StatsError> {
        match selector {
            RouteSelector::ByEntity { category, id } => {
                let entity = self.store.get_entity(*category, id).await?;
                let route_ids = entity.map(|e| e.route_ids).unwrap_or_default();
                if route_ids.is_empty() {
                    // An entity with zero routes is indistinguishable from a
                    // missing one for reporting purposes.
                    return Err(StatsError::NoRoutesForEntity {
                        category: *category,
                        id: id.clone(),
                    });
                }
                let routes = self.fetch_routes(&route_ids).await?;
                Ok(ResolvedRoutes {
                    routes,
                    query_ids: route_ids,
                    truncated: false,
                })
            }
            RouteSelector::All => {
                let route_ids = self.store.all_route_ids().await?;
                let routes = self.fetch_routes(&route_ids).await?;
                Ok(self.capped(routes, route_ids))
            }
            RouteSelector::ByTransportType(transport_type) => {
                let routes = self.store.routes_by_transport(transport_type).await?;
                if routes.is_empty() {
                    return Err(StatsError::NoRoutesForType(transport_type.clone()));
                }
                let route_ids: Vec<String> = routes.iter().map(|r| r.id.clone()).collect();
                Ok(self.capped(routes, route_ids))
            }
        }
    }

    fn capped(&self, routes: Vec<Route>, mut query_ids: Vec<String>) -> ResolvedRoutes {
        let truncated = query_ids.len() > self.route_cap;
        if truncated {
            tracing::warn!(
                total = query_ids.len(),
                cap = self.route_cap,
                "route batch exceeds aggregation cap; usage beyond the cap reports zero"
            );
            query_ids.truncate(self.route_cap);
        }
        ResolvedRoutes {
            routes,
            query_ids,
            truncated,
        }
    }

    /// Fetch metadata for each id concurrently, preserving input order.
    /// A missing document becomes the placeholder route and never fails
    /// the batch; only store failures abort.
    async fn fetch_routes(&self, route_ids: &[String]) -> Result<Vec<Route>, StatsError> {
        let mut routes = Vec::with_capacity(route_ids.len());
        for batch in route_ids.chunks(LOOKUP_FANOUT) {
            let mut handles = Vec::with_capacity(batch.len());
            for id in batch {
                let store = self.store.clone();
                let id = id.clone();
                handles.push(tokio::spawn(async move {
                    let found = store.get_route(&id).await?;
                    Ok::<Route, StatsError>(found.unwrap_or_else(|| Route::placeholder(&id)))
                }));
            }
            for handle in handles {
                let route = handle
                    .await
                    .map_err(|e| StatsError::DocumentQueryFailed(e.into()))??;
                routes.push(route);
            }
        }
        Ok(routes)
    }
}

//! Read-only accessor over the route/city/sponsor document collections.
//!
//! The reporting core never writes here. All lookups are bounded by a short
//! timeout since document reads are expected to be fast.

use std::time::Duration;

use anyhow::anyhow;
use serde::Deserialize;
use tokio::time::timeout;

use crate::db::DbConn;
use crate::error::StatsError;
use crate::models::{
    Category, CityDoc, Entity, EntityMatch, LocalizedName, Route, RouteDoc, SponsorDoc,
};

const DEFAULT_DOC_TIMEOUT: Duration = Duration::from_secs(10);

/// Matcher-facing name for entities with no English display name.
const UNNAMED_ENTITY: &str = "Unknown";

fn doc_failed<E: Into<anyhow::Error>>(e: E) -> StatsError {
    StatsError::DocumentQueryFailed(e.into())
}

fn entity_display_name(name: Option<&LocalizedName>) -> String {
    name.and_then(|n| n.en.clone())
        .unwrap_or_else(|| UNNAMED_ENTITY.to_string())
}

#[derive(Debug, Deserialize)]
struct RouteIdRow {
    route_id: String,
}

#[derive(Clone)]
pub struct CatalogStore {
    db: DbConn,
    timeout: Duration,
}

impl CatalogStore {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            timeout: DEFAULT_DOC_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn timed_out(&self) -> StatsError {
        doc_failed(anyhow!(
            "document store query timed out after {:?}",
            self.timeout
        ))
    }

    /// Lookup a single route by id. `Ok(None)` means no backing document.
    pub async fn get_route(&self, route_id: &str) -> Result<Option<Route>, StatsError> {
        let query = self
            .db
            .query("SELECT * FROM route WHERE route_id = $id LIMIT 1")
            .bind(("id", route_id.to_string()));
        let mut response = timeout(self.timeout, query)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(doc_failed)?;
        let docs: Vec<RouteDoc> = response.take(0).map_err(doc_failed)?;
        Ok(docs.into_iter().next().map(Route::from))
    }

    /// Every route id in the store, in stable id order.
    pub async fn all_route_ids(&self) -> Result<Vec<String>, StatsError> {
        let query = self
            .db
            .query("SELECT route_id FROM route ORDER BY route_id");
        let mut response = timeout(self.timeout, query)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(doc_failed)?;
        let rows: Vec<RouteIdRow> = response.take(0).map_err(doc_failed)?;
        Ok(rows.into_iter().map(|r| r.route_id).collect())
    }

    /// Routes whose `TypeTransportation` array contains the given type,
    /// in stable id order.
    pub async fn routes_by_transport(&self, transport_type: &str) -> Result<Vec<Route>, StatsError> {
        let query = self
            .db
            .query(
                "SELECT * FROM route \
                 WHERE TypeTransportation CONTAINS $transport_type \
                 ORDER BY route_id",
            )
            .bind(("transport_type", transport_type.to_string()));
        let mut response = timeout(self.timeout, query)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(doc_failed)?;
        let docs: Vec<RouteDoc> = response.take(0).map_err(doc_failed)?;
        Ok(docs.into_iter().map(Route::from).collect())
    }

    /// Lookup an entity by its canonical id.
    pub async fn get_entity(
        &self,
        category: Category,
        id: &str,
    ) -> Result<Option<Entity>, StatsError> {
        match category {
            Category::City => {
                let query = self
                    .db
                    .query("SELECT * FROM city WHERE city_id = $id LIMIT 1")
                    .bind(("id", id.to_string()));
                let mut response = timeout(self.timeout, query)
                    .await
                    .map_err(|_| self.timed_out())?
                    .map_err(doc_failed)?;
                let docs: Vec<CityDoc> = response.take(0).map_err(doc_failed)?;
                Ok(docs.into_iter().next().map(Entity::from))
            }
            Category::Sponsor => {
                let query = self
                    .db
                    .query("SELECT * FROM sponsor WHERE sponsor_id = $id LIMIT 1")
                    .bind(("id", id.to_string()));
                let mut response = timeout(self.timeout, query)
                    .await
                    .map_err(|_| self.timed_out())?
                    .map_err(doc_failed)?;
                let docs: Vec<SponsorDoc> = response.take(0).map_err(doc_failed)?;
                Ok(docs.into_iter().next().map(Entity::from))
            }
        }
    }

    /// Id + display name for every entity in the category, in stable id
    /// order. Fed to the matcher; entities without an English name surface
    /// as "Unknown" so they can still be found.
    pub async fn entity_names(&self, category: Category) -> Result<Vec<EntityMatch>, StatsError> {
        match category {
            Category::City => {
                let query = self.db.query("SELECT * FROM city ORDER BY city_id");
                let mut response = timeout(self.timeout, query)
                    .await
                    .map_err(|_| self.timed_out())?
                    .map_err(doc_failed)?;
                let docs: Vec<CityDoc> = response.take(0).map_err(doc_failed)?;
                Ok(docs
                    .into_iter()
                    .map(|doc| EntityMatch {
                        name: entity_display_name(doc.name.as_ref()),
                        id: doc.city_id,
                    })
                    .collect())
            }
            Category::Sponsor => {
                let query = self.db.query("SELECT * FROM sponsor ORDER BY sponsor_id");
                let mut response = timeout(self.timeout, query)
                    .await
                    .map_err(|_| self.timed_out())?
                    .map_err(doc_failed)?;
                let docs: Vec<SponsorDoc> = response.take(0).map_err(doc_failed)?;
                Ok(docs
                    .into_iter()
                    .map(|doc| EntityMatch {
                        name: entity_display_name(doc.name.as_ref()),
                        id: doc.sponsor_id,
                    })
                    .collect())
            }
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Entity category owning route id lists.
///
/// Closed on purpose: transport types stay open strings because partners add
/// new ones, but the entity collections are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    City,
    Sponsor,
}

impl Category {
    pub fn table(&self) -> &'static str {
        match self {
            Category::City => "city",
            Category::Sponsor => "sponsor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Category {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Category::City),
            "sponsor" => Ok(Category::Sponsor),
            other => Err(StatsError::InvalidCategory(other.to_string())),
        }
    }
}

/// Localized display name as stored in the documents. Only the English
/// variant is read today.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedName {
    #[serde(rename = "EN")]
    pub en: Option<String>,
}

impl LocalizedName {
    pub fn english(text: &str) -> Self {
        Self {
            en: Some(text.to_string()),
        }
    }
}

/// Raw route document, matching the external collection schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDoc {
    pub route_id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<LocalizedName>,
    #[serde(rename = "Length", default)]
    pub length: Option<f64>,
    #[serde(rename = "TypeTransportation", default)]
    pub transportation: Option<Vec<String>>,
}

/// Raw city document. `Route` holds the owned route ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityDoc {
    pub city_id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<LocalizedName>,
    #[serde(rename = "Route", default)]
    pub route_ids: Vec<String>,
}

/// Raw sponsor document. `IdRoute` holds the owned route ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorDoc {
    pub sponsor_id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<LocalizedName>,
    #[serde(rename = "IdRoute", default)]
    pub route_ids: Vec<String>,
}

/// One "route detail opened" analytics event. `event_date` is the partition
/// date as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEventDoc {
    pub event_name: String,
    pub route_id: String,
    pub event_date: String,
}

pub const UNKNOWN_ROUTE_NAME: &str = "Unknown Route";

/// Typed route at the store boundary. Document shape problems are defaulted
/// away here, never downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub display_name: String,
    pub length_meters: f64,
    pub transportation_types: Vec<String>,
}

impl Route {
    /// Stand-in for a referenced route id with no backing document.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: UNKNOWN_ROUTE_NAME.to_string(),
            length_meters: 0.0,
            transportation_types: Vec::new(),
        }
    }
}

impl From<RouteDoc> for Route {
    fn from(doc: RouteDoc) -> Self {
        Self {
            id: doc.route_id,
            display_name: doc
                .name
                .and_then(|n| n.en)
                .unwrap_or_else(|| UNKNOWN_ROUTE_NAME.to_string()),
            length_meters: doc.length.unwrap_or(0.0).max(0.0),
            transportation_types: doc.transportation.unwrap_or_default(),
        }
    }
}

/// Typed entity (city or sponsor) at the store boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    pub route_ids: Vec<String>,
}

impl From<CityDoc> for Entity {
    fn from(doc: CityDoc) -> Self {
        Self {
            id: doc.city_id,
            display_name: doc.name.and_then(|n| n.en).unwrap_or_default(),
            route_ids: doc.route_ids,
        }
    }
}

impl From<SponsorDoc> for Entity {
    fn from(doc: SponsorDoc) -> Self {
        Self {
            id: doc.sponsor_id,
            display_name: doc.name.and_then(|n| n.en).unwrap_or_default(),
            route_ids: doc.route_ids,
        }
    }
}

/// Ranked matcher result, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMatch {
    pub id: String,
    pub name: String,
}

/// Per-route session count from the analytics store. A route id with no
/// qualifying events has no record at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub route_id: String,
    pub sessions: u64,
}

/// One reporting row, joined from route metadata and usage counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub route_id: String,
    pub display_name: String,
    pub length_meters: f64,
    pub transportation_types: Vec<String>,
    pub sessions: u64,
    pub trees_planted: u64,
}

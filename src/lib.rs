//! Route usage analytics: joins route metadata from the document
//! collections with per-route session counts from the analytics event
//! store into one reporting table per request.
//!
//! Request flow: matcher -> resolver -> aggregator -> merger. Components
//! hold no cross-request state; each call reads the stores as they are.

pub mod aggregator;
pub mod analytics;
pub mod api;
pub mod db;
pub mod error;
pub(crate) mod fuzzy;
pub mod matcher;
pub mod merger;
pub mod models;
pub mod resolver;
pub mod store;

pub use api::ReportService;
pub use error::StatsError;

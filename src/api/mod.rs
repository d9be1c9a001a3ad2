//! API module for the route usage reporting service.

pub mod handlers;
pub mod service;

pub use service::{Report, ReportCache, ReportService};

//! REST API server for route usage reports.
//!
//! Endpoints:
//!   GET  /api/v1/health             - Health check
//!   POST /api/v1/reports/by-name    - Report for a city/sponsor name ("all" = whole catalog)
//!   POST /api/v1/reports/by-transport - Report for a transportation type
//!   POST /api/v1/suggest            - Ranked name matches for confirmation flows
//!   POST /api/v1/usage/query        - Raw aggregation pass-through (diagnostic)

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use routestats::analytics::AnalyticsStore;
use routestats::api::{handlers, ReportService};
use routestats::db;
use routestats::store::CatalogStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Route usage reporting API server")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to the embedded database
    #[arg(long, default_value = "data/routestats.db")]
    db_path: String,

    /// Maximum route ids per aggregation query
    #[arg(long, default_value_t = 1000)]
    route_cap: usize,

    /// Aggregation query timeout in seconds
    #[arg(long, default_value_t = 120)]
    query_timeout_secs: u64,

    /// Enable the in-process report cache
    #[arg(long)]
    cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();

    let conn = db::connect(&args.db_path).await?;
    db::init_schema(&conn).await?;

    let catalog = CatalogStore::new(conn.clone());
    let analytics = AnalyticsStore::new(conn)
        .with_timeout(Duration::from_secs(args.query_timeout_secs));

    let mut service = ReportService::new(catalog, analytics).with_route_cap(args.route_cap);
    if args.cache {
        service = service.with_cache();
    }

    let app = create_router(Arc::new(service));

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!(%addr, db_path = %args.db_path, "starting report API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(service: Arc<ReportService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/reports/by-name", post(handlers::report_by_name))
        .route(
            "/api/v1/reports/by-transport",
            post(handlers::report_by_transport),
        )
        .route("/api/v1/suggest", post(handlers::suggest))
        .route("/api/v1/usage/query", post(handlers::query_usage))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

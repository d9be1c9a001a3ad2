//! Seed an embedded database with demo catalog and analytics data so the
//! API server can be exercised locally. Dev fixture, not an ingestion
//! pipeline.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use routestats::analytics::OPEN_ROUTE_DETAIL;
use routestats::db;
use routestats::models::{AnalyticsEventDoc, CityDoc, LocalizedName, RouteDoc, SponsorDoc};
use tracing::info;

#[derive(Parser)]
#[command(about = "Seed demo data into the embedded database")]
struct Args {
    /// Path to the embedded database
    #[arg(long, default_value = "data/routestats.db")]
    db_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let conn = db::connect(&args.db_path).await?;
    db::init_schema(&conn).await?;

    let routes = [
        ("r-canal", "Canal Walk", 4000.0, vec!["walk"]),
        ("r-oldtown", "Old Town Loop", 2500.0, vec!["walk", "bike"]),
        ("r-harbor", "Harbor Ride", 8000.0, vec!["bike"]),
        ("r-forest", "Forest Trail", 6200.0, vec!["walk", "run"]),
        ("r-river", "Riverside Run", 5000.0, vec!["run"]),
    ];
    for (id, name, length, types) in routes {
        let _: Option<RouteDoc> = conn
            .create("route")
            .content(RouteDoc {
                route_id: id.to_string(),
                name: Some(LocalizedName::english(name)),
                length: Some(length),
                transportation: Some(types.into_iter().map(String::from).collect()),
            })
            .await?;
    }

    let cities = [
        ("c-paris", "Paris", vec!["r-canal", "r-oldtown"]),
        ("c-lyon", "Lyon", vec!["r-harbor", "r-forest", "r-river"]),
        // References a route with no document on purpose, to exercise the
        // placeholder path.
        ("c-nantes", "Nantes", vec!["r-canal", "r-retired"]),
    ];
    for (id, name, route_ids) in cities {
        let _: Option<CityDoc> = conn
            .create("city")
            .content(CityDoc {
                city_id: id.to_string(),
                name: Some(LocalizedName::english(name)),
                route_ids: route_ids.into_iter().map(String::from).collect(),
            })
            .await?;
    }

    let sponsors = [
        ("s-decathlon", "Decathlon", vec!["r-harbor", "r-river"]),
        ("s-fnac", "Fnac", vec!["r-oldtown"]),
    ];
    for (id, name, route_ids) in sponsors {
        let _: Option<SponsorDoc> = conn
            .create("sponsor")
            .content(SponsorDoc {
                sponsor_id: id.to_string(),
                name: Some(LocalizedName::english(name)),
                route_ids: route_ids.into_iter().map(String::from).collect(),
            })
            .await?;
    }

    // Spread events over 2024, heavier on the popular routes.
    let sessions_per_week = [
        ("r-canal", 14u32),
        ("r-oldtown", 6),
        ("r-harbor", 9),
        ("r-forest", 2),
    ];
    let mut events = 0u32;
    for week in 0..52u32 {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            + chrono::Duration::weeks(week as i64);
        let event_date = date.format("%Y-%m-%d").to_string();
        for (route_id, per_week) in sessions_per_week {
            for _ in 0..per_week {
                let _: Option<AnalyticsEventDoc> = conn
                    .create("analytics_event")
                    .content(AnalyticsEventDoc {
                        event_name: OPEN_ROUTE_DETAIL.to_string(),
                        route_id: route_id.to_string(),
                        event_date: event_date.clone(),
                    })
                    .await?;
                events += 1;
            }
        }
    }

    info!(
        routes = 5,
        cities = 3,
        sponsors = 2,
        events,
        db_path = %args.db_path,
        "demo data seeded"
    );

    Ok(())
}

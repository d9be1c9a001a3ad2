use anyhow::Result;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

pub type DbConn = Surreal<Db>;

/// Initialize database connection with RocksDB backend
pub async fn connect(path: &str) -> Result<DbConn> {
    let db = Surreal::new::<RocksDb>(path).await?;
    db.use_ns("routestats").use_db("stats").await?;
    Ok(db)
}

/// In-memory database, used by tests and throwaway local runs
pub async fn connect_memory() -> Result<DbConn> {
    let db = Surreal::new::<Mem>(()).await?;
    db.use_ns("routestats").use_db("stats").await?;
    Ok(db)
}

/// Initialize database schema
pub async fn init_schema(db: &DbConn) -> Result<()> {
    // Documents stay schemaless: the collection shapes are an external
    // contract and unexpected fields are defaulted at the store boundary.
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS route SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_route_id ON route FIELDS route_id UNIQUE;

        DEFINE TABLE IF NOT EXISTS city SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_city_id ON city FIELDS city_id UNIQUE;

        DEFINE TABLE IF NOT EXISTS sponsor SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_sponsor_id ON sponsor FIELDS sponsor_id UNIQUE;

        DEFINE TABLE IF NOT EXISTS analytics_event SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_event_name ON analytics_event FIELDS event_name;
        DEFINE INDEX IF NOT EXISTS idx_event_date ON analytics_event FIELDS event_date;
        "#,
    )
    .await?;

    Ok(())
}

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::store::postgres::PgStore;

/// Connects to PostgreSQL and makes sure the schema exists.
pub async fn connect(database_url: &str) -> Result<PgStore> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let store = PgStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("Failed to create database schema")?;

    info!("PostgreSQL connection pool established");
    Ok(store)
}

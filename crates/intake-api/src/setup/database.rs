use anyhow::{Context, Result};
use intake_core::Config;
use intake_db::{FileRecordRepository, InMemoryMetadataIndex, MetadataIndex};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Postgres-backed index when `DATABASE_URL` is set, otherwise an in-memory one
pub async fn setup_index(config: &Config) -> Result<Arc<dyn MetadataIndex>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set; file records are kept in memory only");
        return Ok(Arc::new(InMemoryMetadataIndex::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    let repository = FileRecordRepository::new(pool, config.table_name.clone());
    repository
        .ensure_schema()
        .await
        .context("Failed to prepare metadata index table")?;

    tracing::info!(
        table = %config.table_name,
        max_connections = config.db_max_connections,
        "Metadata index connected"
    );

    Ok(Arc::new(repository))
}

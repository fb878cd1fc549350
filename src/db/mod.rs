use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::error::{ArchiveError, ArchiveResult};

pub mod repositories;

pub async fn create_pool(database_url: &str) -> ArchiveResult<PgPool> {
    info!("🔌 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {:?}", e);
            ArchiveError::Database(e)
        })?;

    info!("✅ Database connection pool created");
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> ArchiveResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(ArchiveError::Database)?;

    Ok(())
}

pub async fn run_migrations(pool: &PgPool) -> ArchiveResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ArchiveError::Config(format!("migration failed: {e}")))?;
    Ok(())
}

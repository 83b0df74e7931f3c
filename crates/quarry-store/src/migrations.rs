//! Database migration management.
//!
//! Embeds the SQL migrations in `migrations/` and applies them with `SQLx`'s
//! built-in migrator, which tracks applied versions in `_sqlx_migrations`.

use crate::error::{Result, StoreError};
use sqlx::{Pool, Sqlite};

/// Run all pending database migrations.
///
/// # Errors
/// Returns `StoreError::Migration` if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    let migrator = sqlx::migrate!("./migrations");
    tracing::debug!(available = migrator.iter().count(), "applying dataset migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    tracing::info!(version = get_schema_version(pool).await?, "dataset schema up to date");
    Ok(())
}

/// Highest applied migration version, or 0 on a fresh database.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let table_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?
        > 0;

    if !table_exists {
        return Ok(0);
    }

    let version =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(version), 0) FROM _sqlx_migrations")
            .fetch_optional(pool)
            .await?
            .unwrap_or(0);

    Ok(version)
}

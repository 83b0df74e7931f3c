//! `SQLite` dataset backend.
//!
//! Every dataset is one row in the `datasets` table, keyed by name.

use crate::backend::{check_name, StoreBackend};
use crate::error::Result;
use crate::migrations;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Datasets stored in a single `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
}

impl SqliteBackend {
    /// Open (creating if missing) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns `StoreError::Database` if the file cannot be opened and
    /// `StoreError::Migration` if the schema cannot be brought up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        tracing::info!("Dataset database opened at {}", path.display());
        Self::from_pool(pool).await
    }

    /// A private in-memory database, mostly for tests.
    ///
    /// Limited to one connection so every query sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        migrations::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Dataset database closed");
    }
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        check_name(name)?;
        let body: Option<Vec<u8>> = sqlx::query_scalar(
            r"
            SELECT body
            FROM datasets
            WHERE name = ?
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(body)
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        sqlx::query(
            r"
            INSERT INTO datasets (name, body, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(name) DO UPDATE SET
                body = excluded.body,
                updated_at = datetime('now')
            ",
        )
        .bind(name)
        .bind(bytes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

//! SQLite connection pool and schema.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::sites::SiteCatalog;
use crate::snapshots::SnapshotCatalog;

/// Shared database handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create the database at the given path and apply the schema.
    pub async fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Database(format!("Connection failed: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(path = %path.display(), "Opened weather database");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    ///
    /// Every SQLite connection to `:memory:` is its own database, so the pool
    /// holds exactly one connection that is never recycled.
    pub async fn open_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Database(format!("Connection failed: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> StorageResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Site registry backed by this database.
    pub fn sites(&self) -> SiteCatalog {
        SiteCatalog::new(self.pool.clone())
    }

    /// Snapshot store backed by this database.
    pub fn snapshots(&self) -> SnapshotCatalog {
        SnapshotCatalog::new(self.pool.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Fixed-width RFC 3339 so that text order matches time order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", value, e)))
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS launchsites (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    latitude DOUBLE NOT NULL,
    longitude DOUBLE NOT NULL,
    elevation INTEGER
);

CREATE TABLE IF NOT EXISTS weather_snapshots (
    id TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    schema_version TEXT NOT NULL DEFAULT 'v1',
    launchsite_id TEXT NOT NULL REFERENCES launchsites(id),
    payload TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_weather_launchsite_fetched
    ON weather_snapshots(launchsite_id, fetched_at DESC)
"#;

//! Append-only weather snapshot store.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use weather_common::{ForecastPayload, SiteId, SnapshotDraft, SnapshotId, WeatherSnapshot};

use crate::database::{format_timestamp, parse_timestamp};
use crate::error::{StorageError, StorageResult};

/// Persistence contract for ingested forecasts.
///
/// Snapshots are never updated or deleted through this interface.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a draft, assigning its id and `fetched_at`.
    async fn save(&self, draft: SnapshotDraft) -> StorageResult<WeatherSnapshot>;

    /// Most recently fetched snapshot for a site.
    async fn find_latest(&self, site_id: SiteId) -> StorageResult<Option<WeatherSnapshot>>;
}

/// SQLite-backed snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    pool: SqlitePool,
}

impl SnapshotCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of snapshots stored for a site.
    pub async fn count_for_site(&self, site_id: SiteId) -> StorageResult<u64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM weather_snapshots WHERE launchsite_id = ?")
                .bind(site_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))?;

        Ok(count.0 as u64)
    }
}

#[async_trait]
impl SnapshotStore for SnapshotCatalog {
    async fn save(&self, draft: SnapshotDraft) -> StorageResult<WeatherSnapshot> {
        let id = SnapshotId::new();
        // Stored with microsecond precision; truncate so the returned value matches.
        let fetched_at = Utc::now().trunc_subsecs(6);

        sqlx::query(
            r#"
            INSERT INTO weather_snapshots (
                id, provider, schema_version, launchsite_id, payload, fetched_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&draft.provider)
        .bind(draft.schema_version())
        .bind(draft.site_id.to_string())
        .bind(draft.payload.as_json())
        .bind(format_timestamp(fetched_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("Insert failed: {}", e)))?;

        debug!(snapshot_id = %id, site_id = %draft.site_id, "Saved weather snapshot");

        Ok(WeatherSnapshot::from_draft(draft, id, fetched_at))
    }

    async fn find_latest(&self, site_id: SiteId) -> StorageResult<Option<WeatherSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT id, provider, schema_version, launchsite_id, payload, fetched_at \
             FROM weather_snapshots WHERE launchsite_id = ? \
             ORDER BY fetched_at DESC, rowid DESC LIMIT 1",
        )
        .bind(site_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))?;

        row.map(WeatherSnapshot::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct SnapshotRow {
    id: String,
    provider: String,
    schema_version: String,
    launchsite_id: String,
    payload: String,
    fetched_at: String,
}

impl TryFrom<SnapshotRow> for WeatherSnapshot {
    type Error = StorageError;

    fn try_from(row: SnapshotRow) -> StorageResult<Self> {
        let id = row
            .id
            .parse::<SnapshotId>()
            .map_err(|e| StorageError::Corrupt(format!("bad snapshot id '{}': {}", row.id, e)))?;
        let site_id = row.launchsite_id.parse::<SiteId>().map_err(|e| {
            StorageError::Corrupt(format!("bad site id '{}': {}", row.launchsite_id, e))
        })?;
        let payload = ForecastPayload::from_json(row.payload)
            .map_err(|e| StorageError::Corrupt(format!("bad payload for {}: {}", id, e)))?;

        Ok(WeatherSnapshot {
            id,
            provider: row.provider,
            schema_version: row.schema_version,
            site_id,
            payload,
            fetched_at: parse_timestamp(&row.fetched_at)?,
        })
    }
}

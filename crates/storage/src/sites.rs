//! Launch site registry.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use weather_common::{Site, SiteId};

use crate::error::{StorageError, StorageResult};

/// Read-only access to registered launch sites.
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// All registered sites at call time.
    async fn list_all(&self) -> StorageResult<Vec<Site>>;

    /// A single site, or `None` if it is not registered.
    async fn get(&self, id: SiteId) -> StorageResult<Option<Site>>;
}

/// SQLite-backed site registry.
#[derive(Debug, Clone)]
pub struct SiteCatalog {
    pool: SqlitePool,
}

impl SiteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a site. Used to seed the registry from a sites file.
    pub async fn upsert(&self, site: &Site) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO launchsites (id, name, latitude, longitude, elevation)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                elevation = excluded.elevation
            "#,
        )
        .bind(site.id.to_string())
        .bind(&site.name)
        .bind(site.latitude)
        .bind(site.longitude)
        .bind(site.elevation)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("Upsert failed: {}", e)))?;

        debug!(site_id = %site.id, name = %site.name, "Upserted launch site");
        Ok(())
    }
}

#[async_trait]
impl SiteRegistry for SiteCatalog {
    async fn list_all(&self) -> StorageResult<Vec<Site>> {
        let rows = sqlx::query_as::<_, SiteRow>(
            "SELECT id, name, latitude, longitude, elevation FROM launchsites ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))?;

        rows.into_iter().map(Site::try_from).collect()
    }

    async fn get(&self, id: SiteId) -> StorageResult<Option<Site>> {
        let row = sqlx::query_as::<_, SiteRow>(
            "SELECT id, name, latitude, longitude, elevation FROM launchsites WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("Query failed: {}", e)))?;

        row.map(Site::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct SiteRow {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    elevation: Option<i64>,
}

impl TryFrom<SiteRow> for Site {
    type Error = StorageError;

    fn try_from(row: SiteRow) -> StorageResult<Self> {
        let id = row
            .id
            .parse::<SiteId>()
            .map_err(|e| StorageError::Corrupt(format!("bad site id '{}': {}", row.id, e)))?;
        let elevation = row
            .elevation
            .map(i32::try_from)
            .transpose()
            .map_err(|e| StorageError::Corrupt(format!("bad elevation for {}: {}", id, e)))?;

        Ok(Site {
            id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation,
        })
    }
}

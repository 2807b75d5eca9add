//! Ingestion orchestrator.
//!
//! Resolves sites, fetches forecasts from the provider and appends snapshots.
//! A batch run fans out over the registry with bounded concurrency and keeps
//! going when individual sites fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use storage::{SiteRegistry, SnapshotStore};
use weather_common::{SiteId, SnapshotDraft, SnapshotId};

use crate::config::IngestionConfig;
use crate::error::{IngestionError, Result, SyncError};
use crate::provider::WeatherProvider;
use crate::summary::SyncSummary;

pub struct IngestionOrchestrator {
    registry: Arc<dyn SiteRegistry>,
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn SnapshotStore>,
    config: IngestionConfig,
    /// Set for the duration of a batch run
    running: AtomicBool,
}

/// Clears the running flag when a batch ends, including on drop of the batch future.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IngestionOrchestrator {
    pub fn new(
        registry: Arc<dyn SiteRegistry>,
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn SnapshotStore>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            store,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Whether a batch run is in progress.
    pub fn is_syncing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Fetch the current forecast for one site and append it as a snapshot.
    ///
    /// Nothing is written when the site is unknown or the provider fails.
    #[instrument(skip_all, fields(site_id = %site_id, provider = %self.provider.name()))]
    pub async fn fetch_and_store(&self, site_id: SiteId) -> Result<SnapshotId> {
        let result = self.ingest_site(site_id).await;

        match &result {
            Ok(snapshot_id) => {
                counter!("weather_snapshots_written_total").increment(1);
                debug!(snapshot_id = %snapshot_id, "Stored weather snapshot");
            }
            Err(e) => {
                counter!("weather_fetch_failures_total", "kind" => e.kind()).increment(1);
                warn!(kind = e.kind(), error = %e, "Site ingestion failed");
            }
        }

        result
    }

    async fn ingest_site(&self, site_id: SiteId) -> Result<SnapshotId> {
        let site = self
            .registry
            .get(site_id)
            .await?
            .ok_or(IngestionError::SiteNotFound(site_id))?;

        let elevation = site.elevation_or(self.config.default_elevation);
        let payload = self
            .provider
            .fetch(site.latitude, site.longitude, elevation)
            .await?;

        let draft = SnapshotDraft::new(self.provider.name(), site.id, payload)
            .with_schema_version(self.config.schema_version.clone());
        let snapshot = self.store.save(draft).await?;

        Ok(snapshot.id)
    }

    /// Run one batch across every registered site.
    pub async fn sync_once(&self) -> std::result::Result<SyncSummary, SyncError> {
        self.sync_once_until(CancellationToken::new()).await
    }

    /// Run one batch, scheduling no further sites once `cancel` fires.
    ///
    /// Sites already in flight finish and their snapshots are kept.
    #[instrument(skip_all)]
    pub async fn sync_once_until(
        &self,
        cancel: CancellationToken,
    ) -> std::result::Result<SyncSummary, SyncError> {
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                counter!("weather_sync_rejected_total").increment(1);
                warn!("Sync requested while another run is in progress");
                return Err(SyncError::AlreadyRunning);
            }
        };

        let started_at = Utc::now();
        let timer = Instant::now();

        let site_ids: Vec<SiteId> = self
            .registry
            .list_all()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list launch sites");
                SyncError::Registry(e)
            })?
            .into_iter()
            .map(|site| site.id)
            .collect();

        let total = site_ids.len();
        info!(sites = total, max_concurrent = self.config.max_concurrent, "Starting weather sync");

        let results = stream::iter(site_ids)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|site_id| async move { (site_id, self.fetch_and_store(site_id).await) })
            .buffer_unordered(self.config.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut summary = SyncSummary::new(started_at);
        for (site_id, result) in results {
            summary.record(site_id, result);
        }
        let cancelled = summary.attempted < total;
        let summary = summary.finish(Utc::now(), cancelled);

        counter!("weather_sync_runs_total").increment(1);
        histogram!("weather_sync_duration_ms").record(timer.elapsed().as_millis() as f64);

        if cancelled {
            warn!(
                attempted = summary.attempted,
                skipped = total - summary.attempted,
                "Weather sync cancelled"
            );
        }
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "Weather sync complete"
        );

        Ok(summary)
    }
}

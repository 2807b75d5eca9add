//! Batch run results.

use chrono::{DateTime, Utc};

use weather_common::{SiteId, SnapshotId};

use crate::error::IngestionError;

/// A site whose ingestion failed during a batch run.
#[derive(Debug, Clone)]
pub struct SiteFailure {
    pub site_id: SiteId,
    pub error: IngestionError,
}

/// Outcome of one batch run across the site registry.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Sites whose ingestion was started
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<SiteFailure>,
    /// Set when the run stopped scheduling sites before the registry was exhausted
    pub cancelled: bool,
}

impl SyncSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            attempted: 0,
            succeeded: 0,
            failed: Vec::new(),
            cancelled: false,
        }
    }

    /// Account for one finished site.
    pub fn record(&mut self, site_id: SiteId, result: Result<SnapshotId, IngestionError>) {
        self.attempted += 1;
        match result {
            Ok(_) => self.succeeded += 1,
            Err(error) => self.failed.push(SiteFailure { site_id, error }),
        }
    }

    pub fn finish(mut self, finished_at: DateTime<Utc>, cancelled: bool) -> Self {
        self.finished_at = finished_at;
        self.cancelled = cancelled;
        self
    }

    pub fn failed_site_ids(&self) -> Vec<SiteId> {
        self.failed.iter().map(|f| f.site_id).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

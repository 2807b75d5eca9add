//! Bookkeeping of the most recent batch run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use ingestion::SyncSummary;

/// What started a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Scheduled,
    Startup,
}

/// A finished batch run as reported by `/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl RunRecord {
    pub fn from_summary(trigger: Trigger, summary: &SyncSummary) -> Self {
        Self {
            trigger,
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            duration_ms: summary.duration_ms(),
            attempted: summary.attempted,
            succeeded: summary.succeeded,
            failed: summary.failed.len(),
            cancelled: summary.cancelled,
        }
    }
}

/// Keeps the last completed run from any trigger.
#[derive(Default)]
pub struct RunTracker {
    last: Mutex<Option<RunRecord>>,
    completed: Mutex<u64>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, trigger: Trigger, summary: &SyncSummary) {
        *self.last.lock().await = Some(RunRecord::from_summary(trigger, summary));
        *self.completed.lock().await += 1;
    }

    pub async fn last_run(&self) -> Option<RunRecord> {
        self.last.lock().await.clone()
    }

    pub async fn completed_runs(&self) -> u64 {
        *self.completed.lock().await
    }
}

//! Daily sync trigger.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ingestion::{IngestionOrchestrator, SyncError};

use crate::tracker::{RunTracker, Trigger};

/// A fixed UTC wall-clock time, once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            return today;
        }
        // Adding one day to a UTC date only fails at the end of chrono's range.
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(self.at).and_utc())
            .unwrap_or(today)
    }
}

pub struct Scheduler {
    orchestrator: Arc<IngestionOrchestrator>,
    tracker: Arc<RunTracker>,
    schedule: DailySchedule,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<IngestionOrchestrator>,
        tracker: Arc<RunTracker>,
        schedule: DailySchedule,
    ) -> Self {
        Self {
            orchestrator,
            tracker,
            schedule,
        }
    }

    /// Sleep until each scheduled time and run a batch, until `shutdown` fires.
    pub async fn run_forever(&self, shutdown: CancellationToken) {
        loop {
            let now = Utc::now();
            let next = self.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Scheduled next weather sync");

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutting down scheduler");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            self.run_once(shutdown.child_token()).await;
        }
    }

    async fn run_once(&self, cancel: CancellationToken) {
        match self.orchestrator.sync_once_until(cancel).await {
            Ok(summary) => {
                self.tracker.record(Trigger::Scheduled, &summary).await;
            }
            Err(SyncError::AlreadyRunning) => {
                warn!("Skipping scheduled sync, a run is already in progress");
            }
            Err(e) => {
                error!(error = %e, "Scheduled sync failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ingestion::{IngestionConfig, ProviderError};
    use test_utils::{three_sites, InMemorySiteRegistry, InMemorySnapshotStore, StubProvider};

    fn at(h: u32, m: u32) -> DailySchedule {
        DailySchedule::new(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_next_after_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            at(12, 30).next_after(now),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            at(0, 0).next_after(now),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_exact_time_is_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(
            at(0, 0).next_after(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            at(0, 0).next_after(now),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    struct Fixture {
        scheduler: Scheduler,
        orchestrator: Arc<IngestionOrchestrator>,
        tracker: Arc<RunTracker>,
        provider: Arc<StubProvider>,
        store: Arc<InMemorySnapshotStore>,
    }

    fn fixture(provider: StubProvider) -> Fixture {
        let provider = Arc::new(provider);
        let store = Arc::new(InMemorySnapshotStore::new());
        let orchestrator = Arc::new(IngestionOrchestrator::new(
            Arc::new(InMemorySiteRegistry::new(three_sites())),
            provider.clone(),
            store.clone(),
            IngestionConfig::default(),
        ));
        let tracker = Arc::new(RunTracker::new());
        let scheduler = Scheduler::new(orchestrator.clone(), tracker.clone(), at(0, 0));
        Fixture {
            scheduler,
            orchestrator,
            tracker,
            provider,
            store,
        }
    }

    #[tokio::test]
    async fn test_run_once_records_scheduled_run() {
        let f = fixture(StubProvider::new());
        let failing = three_sites()[2].clone();
        f.provider
            .fail_at(failing.latitude, failing.longitude, ProviderError::HttpStatus(503))
            .await;

        f.scheduler.run_once(CancellationToken::new()).await;

        let last = f.tracker.last_run().await.unwrap();
        assert_eq!(last.trigger, Trigger::Scheduled);
        assert_eq!(last.attempted, 3);
        assert_eq!(last.succeeded, 2);
        assert_eq!(last.failed, 1);
        assert!(!last.cancelled);
        assert_eq!(f.tracker.completed_runs().await, 1);
        assert_eq!(f.store.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_once_skips_while_batch_running() {
        let (provider, gate) = StubProvider::new().gated();
        let f = fixture(provider);

        let manual = tokio::spawn({
            let orchestrator = f.orchestrator.clone();
            async move { orchestrator.sync_once().await }
        });
        f.provider.wait_for_calls(1).await;

        f.scheduler.run_once(CancellationToken::new()).await;

        assert!(f.tracker.last_run().await.is_none());
        assert_eq!(f.tracker.completed_runs().await, 0);

        gate.add_permits(3);
        assert_eq!(manual.await.unwrap().unwrap().succeeded, 3);
        assert_eq!(f.provider.call_count().await, 3);
    }
}

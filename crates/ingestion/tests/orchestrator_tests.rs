//! Orchestrator behaviour against in-memory and SQLite collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ingestion::{
    IngestionConfig, IngestionError, IngestionOrchestrator, ProviderError, SyncError,
};
use storage::{Database, SnapshotStore};
use test_utils::{
    assert_call_at, site, site_without_elevation, sites, three_sites, InMemorySiteRegistry,
    InMemorySnapshotStore, StubProvider,
};
use tokio_util::sync::CancellationToken;
use weather_common::{Site, SiteId};

struct Harness {
    registry: Arc<InMemorySiteRegistry>,
    provider: Arc<StubProvider>,
    store: Arc<InMemorySnapshotStore>,
    orchestrator: Arc<IngestionOrchestrator>,
}

fn harness(sites: Vec<Site>, provider: StubProvider, config: IngestionConfig) -> Harness {
    let registry = Arc::new(InMemorySiteRegistry::new(sites));
    let provider = Arc::new(provider);
    let store = Arc::new(InMemorySnapshotStore::new());
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        registry.clone(),
        provider.clone(),
        store.clone(),
        config,
    ));
    Harness {
        registry,
        provider,
        store,
        orchestrator,
    }
}

#[tokio::test]
async fn test_fetch_and_store_writes_one_snapshot() {
    let db = Database::open_memory().await.unwrap();
    let brauneck = site(sites::BRAUNECK);
    db.sites().upsert(&brauneck).await.unwrap();

    let orchestrator = IngestionOrchestrator::new(
        Arc::new(db.sites()),
        Arc::new(StubProvider::new().named("meteoblue")),
        Arc::new(db.snapshots()),
        IngestionConfig::default(),
    );

    let before = Utc::now();
    let snapshot_id = orchestrator.fetch_and_store(brauneck.id).await.unwrap();

    assert_eq!(db.snapshots().count_for_site(brauneck.id).await.unwrap(), 1);
    let stored = db.snapshots().find_latest(brauneck.id).await.unwrap().unwrap();
    assert_eq!(stored.id, snapshot_id);
    assert_eq!(stored.site_id, brauneck.id);
    assert_eq!(stored.provider, "meteoblue");
    assert_eq!(stored.schema_version, "v1");
    // Storage keeps microseconds, so allow for truncation.
    assert!(stored.fetched_at >= before - chrono::Duration::milliseconds(1));
    assert!(stored.fetched_at <= Utc::now());
}

#[tokio::test]
async fn test_fetch_and_store_unknown_site() {
    let h = harness(three_sites(), StubProvider::new(), IngestionConfig::default());
    let unknown = SiteId::new();

    let err = h.orchestrator.fetch_and_store(unknown).await.unwrap_err();

    assert!(matches!(err, IngestionError::SiteNotFound(id) if id == unknown));
    assert_eq!(h.provider.call_count().await, 0);
    assert!(h.store.all().await.is_empty());
}

#[tokio::test]
async fn test_fetch_and_store_provider_timeout() {
    let brauneck = site(sites::BRAUNECK);
    let h = harness(vec![brauneck.clone()], StubProvider::new(), IngestionConfig::default());
    h.provider
        .fail_at(
            brauneck.latitude,
            brauneck.longitude,
            ProviderError::Transport("request timed out".into()),
        )
        .await;

    let err = h.orchestrator.fetch_and_store(brauneck.id).await.unwrap_err();

    assert!(matches!(
        err,
        IngestionError::Provider(ProviderError::Transport(_))
    ));
    assert_eq!(err.kind(), "provider_transport");
    assert!(h.store.all().await.is_empty());
}

#[tokio::test]
async fn test_fetch_and_store_persistence_failure() {
    let wank = site(sites::WANK);
    let h = harness(vec![wank.clone()], StubProvider::new(), IngestionConfig::default());
    h.store.fail_saves(true);

    let err = h.orchestrator.fetch_and_store(wank.id).await.unwrap_err();

    assert_eq!(err.kind(), "persistence");
    assert_eq!(h.provider.call_count().await, 1);
}

#[tokio::test]
async fn test_site_elevation_is_passed_to_provider() {
    let brauneck = site(sites::BRAUNECK);
    let h = harness(vec![brauneck.clone()], StubProvider::new(), IngestionConfig::default());

    h.orchestrator.fetch_and_store(brauneck.id).await.unwrap();

    let calls = h.provider.calls().await;
    assert_eq!(calls.len(), 1);
    assert_call_at!(calls[0], (brauneck.latitude, brauneck.longitude), 1555);
}

#[tokio::test]
async fn test_missing_elevation_uses_configured_default() {
    let bare = site_without_elevation("Hochries", 47.7461, 12.2472);
    let h = harness(vec![bare.clone()], StubProvider::new(), IngestionConfig::default());

    h.orchestrator.fetch_and_store(bare.id).await.unwrap();
    assert_call_at!(h.provider.calls().await[0], (47.7461, 12.2472), 171);

    let h = harness(
        vec![bare.clone()],
        StubProvider::new(),
        IngestionConfig::default().with_default_elevation(600),
    );
    h.orchestrator.fetch_and_store(bare.id).await.unwrap();
    assert_call_at!(h.provider.calls().await[0], (47.7461, 12.2472), 600);
}

#[tokio::test]
async fn test_sync_once_all_sites_succeed() {
    let sites = three_sites();
    let h = harness(sites.clone(), StubProvider::new(), IngestionConfig::default());

    let summary = h.orchestrator.sync_once().await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 3);
    assert!(summary.failed.is_empty());
    assert!(!summary.cancelled);
    assert!(summary.finished_at >= summary.started_at);
    for site in &sites {
        assert_eq!(h.store.count_for(site.id).await, 1);
    }
}

#[tokio::test]
async fn test_sync_once_isolates_failing_site() {
    let sites = three_sites();
    let (a, b, c) = (&sites[0], &sites[1], &sites[2]);
    let h = harness(sites.clone(), StubProvider::new(), IngestionConfig::default());
    h.provider
        .fail_at(b.latitude, b.longitude, ProviderError::HttpStatus(500))
        .await;

    let summary = h.orchestrator.sync_once().await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed_site_ids(), vec![b.id]);
    assert!(matches!(
        summary.failed[0].error,
        IngestionError::Provider(ProviderError::HttpStatus(500))
    ));
    assert_eq!(h.store.count_for(a.id).await, 1);
    assert_eq!(h.store.count_for(b.id).await, 0);
    assert_eq!(h.store.count_for(c.id).await, 1);
}

#[tokio::test]
async fn test_sync_once_empty_registry() {
    let h = harness(Vec::new(), StubProvider::new(), IngestionConfig::default());

    let summary = h.orchestrator.sync_once().await.unwrap();

    assert_eq!(summary.attempted, 0);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn test_sync_once_registry_failure() {
    let h = harness(three_sites(), StubProvider::new(), IngestionConfig::default());
    h.registry.fail_listing(true);

    let err = h.orchestrator.sync_once().await.unwrap_err();

    assert!(matches!(err, SyncError::Registry(_)));
    assert_eq!(h.provider.call_count().await, 0);
    assert!(!h.orchestrator.is_syncing());
}

#[tokio::test]
async fn test_concurrent_sync_is_rejected() {
    let sites = three_sites();
    let (provider, gate) = StubProvider::new().gated();
    let h = harness(sites.clone(), provider, IngestionConfig::default());

    let first = tokio::spawn({
        let orchestrator = h.orchestrator.clone();
        async move { orchestrator.sync_once().await }
    });
    h.provider.wait_for_calls(1).await;

    assert!(h.orchestrator.is_syncing());
    let second = h.orchestrator.sync_once().await;
    assert!(matches!(second, Err(SyncError::AlreadyRunning)));

    gate.add_permits(sites.len());
    let summary = first.await.unwrap().unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(h.provider.call_count().await, 3);
    for site in &sites {
        assert_eq!(h.store.count_for(site.id).await, 1);
    }
    assert!(!h.orchestrator.is_syncing());

    // The run flag is cleared, so a later run goes ahead.
    gate.add_permits(sites.len());
    assert_eq!(h.orchestrator.sync_once().await.unwrap().succeeded, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_polling_never_rejects_a_sync() {
    let h = harness(Vec::new(), StubProvider::new(), IngestionConfig::default());
    let done = Arc::new(AtomicBool::new(false));

    let pollers: Vec<_> = (0..3)
        .map(|_| {
            let orchestrator = h.orchestrator.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let mut polls = 0u64;
                while !done.load(Ordering::Relaxed) {
                    std::hint::black_box(orchestrator.is_syncing());
                    polls += 1;
                    if polls % 1024 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    let mut rejected = 0;
    for _ in 0..5_000 {
        if matches!(h.orchestrator.sync_once().await, Err(SyncError::AlreadyRunning)) {
            rejected += 1;
        }
    }
    done.store(true, Ordering::Relaxed);
    for poller in pollers {
        poller.await.unwrap();
    }

    assert_eq!(rejected, 0);
    assert!(!h.orchestrator.is_syncing());
}

#[tokio::test]
async fn test_dropped_batch_clears_running_flag() {
    let (provider, _gate) = StubProvider::new().gated();
    let h = harness(three_sites(), provider, IngestionConfig::default());

    let run = tokio::spawn({
        let orchestrator = h.orchestrator.clone();
        async move { orchestrator.sync_once().await }
    });
    h.provider.wait_for_calls(1).await;
    assert!(h.orchestrator.is_syncing());

    run.abort();
    assert!(run.await.unwrap_err().is_cancelled());
    assert!(!h.orchestrator.is_syncing());
}

#[tokio::test]
async fn test_fan_out_is_bounded() {
    let sites: Vec<Site> = (0..8)
        .map(|i| Site::new(format!("Site {}", i), 47.0 + i as f64 * 0.1, 11.0))
        .collect();
    let h = harness(
        sites,
        StubProvider::new().with_delay(Duration::from_millis(30)),
        IngestionConfig::default().with_max_concurrent(2),
    );

    let summary = h.orchestrator.sync_once().await.unwrap();

    assert_eq!(summary.succeeded, 8);
    assert!(h.provider.max_in_flight() <= 2, "saw {}", h.provider.max_in_flight());
}

#[tokio::test]
async fn test_cancellation_stops_scheduling_but_keeps_written_snapshots() {
    let sites = three_sites();
    let (provider, gate) = StubProvider::new().gated();
    let h = harness(
        sites.clone(),
        provider,
        IngestionConfig::default().with_max_concurrent(1),
    );
    let cancel = CancellationToken::new();

    let run = tokio::spawn({
        let orchestrator = h.orchestrator.clone();
        let cancel = cancel.clone();
        async move { orchestrator.sync_once_until(cancel).await }
    });
    h.provider.wait_for_calls(1).await;
    cancel.cancel();
    gate.add_permits(sites.len());

    let summary = run.await.unwrap().unwrap();

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.cancelled);
    assert_eq!(h.provider.call_count().await, 1);
    assert_eq!(h.store.all().await.len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_attempts_nothing() {
    let h = harness(three_sites(), StubProvider::new(), IngestionConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = h.orchestrator.sync_once_until(cancel).await.unwrap();

    assert_eq!(summary.attempted, 0);
    assert!(summary.cancelled);
    assert_eq!(h.provider.call_count().await, 0);
}

#[tokio::test]
async fn test_site_removed_between_listing_and_fetch() {
    let sites = three_sites();
    let (provider, gate) = StubProvider::new().gated();
    let h = harness(
        sites.clone(),
        provider,
        IngestionConfig::default().with_max_concurrent(1),
    );

    let run = tokio::spawn({
        let orchestrator = h.orchestrator.clone();
        async move { orchestrator.sync_once().await }
    });
    h.provider.wait_for_calls(1).await;
    h.registry.remove(sites[2].id).await;
    gate.add_permits(sites.len());

    let summary = run.await.unwrap().unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed_site_ids(), vec![sites[2].id]);
    assert_eq!(summary.failed[0].error.kind(), "site_not_found");
}

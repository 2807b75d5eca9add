//! In-memory stand-ins for the registry, snapshot store and provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use ingestion::{ProviderError, WeatherProvider};
use storage::{SiteRegistry, SnapshotStore, StorageError, StorageResult};
use weather_common::{
    ForecastPayload, Site, SiteId, SnapshotDraft, SnapshotId, WeatherSnapshot,
};

use crate::fixtures::sample_payload;

/// Site registry backed by a vector. `list_all` keeps insertion order.
#[derive(Default)]
pub struct InMemorySiteRegistry {
    sites: Mutex<Vec<Site>>,
    fail_listing: AtomicBool,
}

impl InMemorySiteRegistry {
    pub fn new(sites: Vec<Site>) -> Self {
        Self {
            sites: Mutex::new(sites),
            fail_listing: AtomicBool::new(false),
        }
    }

    pub async fn insert(&self, site: Site) {
        self.sites.lock().await.push(site);
    }

    pub async fn remove(&self, id: SiteId) {
        self.sites.lock().await.retain(|s| s.id != id);
    }

    /// Make `list_all` fail until reset.
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SiteRegistry for InMemorySiteRegistry {
    async fn list_all(&self) -> StorageResult<Vec<Site>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StorageError::Database("registry unavailable".to_string()));
        }
        Ok(self.sites.lock().await.clone())
    }

    async fn get(&self, id: SiteId) -> StorageResult<Option<Site>> {
        Ok(self.sites.lock().await.iter().find(|s| s.id == id).cloned())
    }
}

/// Append-only snapshot store backed by a vector.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<Vec<WeatherSnapshot>>,
    fail_saves: AtomicBool,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `save` fail until reset.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<WeatherSnapshot> {
        self.snapshots.lock().await.clone()
    }

    pub async fn count_for(&self, site_id: SiteId) -> usize {
        self.snapshots
            .lock()
            .await
            .iter()
            .filter(|s| s.site_id == site_id)
            .count()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, draft: SnapshotDraft) -> StorageResult<WeatherSnapshot> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Database("disk full".to_string()));
        }
        let snapshot = WeatherSnapshot::from_draft(draft, SnapshotId::new(), chrono::Utc::now());
        self.snapshots.lock().await.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn find_latest(&self, site_id: SiteId) -> StorageResult<Option<WeatherSnapshot>> {
        // Later inserts win ties on fetched_at.
        let snapshots = self.snapshots.lock().await;
        let mut latest: Option<&WeatherSnapshot> = None;
        for snapshot in snapshots.iter().filter(|s| s.site_id == site_id) {
            if latest.map_or(true, |l| snapshot.fetched_at >= l.fetched_at) {
                latest = Some(snapshot);
            }
        }
        Ok(latest.cloned())
    }
}

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_asl: i32,
}

/// Scriptable weather provider.
///
/// Returns [`sample_payload`] unless a failure is registered for the
/// requested coordinate. Calls can be delayed or held behind a gate.
pub struct StubProvider {
    name: String,
    payload: ForecastPayload,
    failures: Mutex<Vec<(f64, f64, ProviderError)>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<ProviderCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            name: "stub".to_string(),
            payload: sample_payload(),
            failures: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_payload(mut self, payload: ForecastPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every call until a permit is added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Fail calls for this exact coordinate.
    pub async fn fail_at(&self, latitude: f64, longitude: f64, error: ProviderError) {
        self.failures.lock().await.push((latitude, longitude, error));
    }

    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Highest number of overlapping `fetch` calls seen so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` calls have started.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count().await < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        elevation_asl: i32,
    ) -> Result<ForecastPayload, ProviderError> {
        self.calls.lock().await.push(ProviderCall {
            latitude,
            longitude,
            elevation_asl,
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self
            .failures
            .lock()
            .await
            .iter()
            .find(|(lat, lon, _)| *lat == latitude && *lon == longitude)
            .map(|(_, _, error)| error.clone());

        match failure {
            Some(error) => Err(error),
            None => Ok(self.payload.clone()),
        }
    }
}

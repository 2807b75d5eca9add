//! HTTP server for the weather sync service.
//!
//! Provides endpoints for:
//! - `POST /sync` - Run a batch now (also at `/api/weather-sync`)
//! - `GET /status` - Current and last run
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use ingestion::{IngestionOrchestrator, SiteFailure, SyncError, SyncSummary};
use weather_common::SiteId;

use crate::tracker::{RunRecord, RunTracker, Trigger};

/// Shared state for the HTTP server.
pub struct ServerState {
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub tracker: Arc<RunTracker>,
    /// Absent when no recorder is installed (tests)
    pub metrics: Option<PrometheusHandle>,
    /// Cancelled on process shutdown; manual runs use a child token
    pub shutdown: CancellationToken,
}

/// Response body for `POST /sync`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub processed_items: usize,
    pub succeeded: usize,
    pub failed: Vec<FailureBody>,
    pub cancelled: bool,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub site_id: SiteId,
    pub kind: &'static str,
    pub message: String,
}

impl From<&SiteFailure> for FailureBody {
    fn from(failure: &SiteFailure) -> Self {
        Self {
            site_id: failure.site_id,
            kind: failure.error.kind(),
            message: failure.error.to_string(),
        }
    }
}

impl SyncResponse {
    fn new(summary: &SyncSummary, triggered_at: DateTime<Utc>) -> Self {
        Self {
            processed_items: summary.attempted,
            succeeded: summary.succeeded,
            failed: summary.failed.iter().map(FailureBody::from).collect(),
            cancelled: summary.cancelled,
            triggered_at,
        }
    }
}

/// Generic failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Response for `GET /status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub running: bool,
    pub completed_runs: u64,
    pub last_run: Option<RunRecord>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// POST /sync - Run a batch across all launch sites
///
/// The batch runs on its own task, so a client that disconnects stops only
/// the wait for the summary.
async fn sync_handler(Extension(state): Extension<Arc<ServerState>>) -> Response {
    let triggered_at = Utc::now();
    info!("Received manual sync request");

    let run = tokio::spawn({
        let state = state.clone();
        async move {
            let result = state
                .orchestrator
                .sync_once_until(state.shutdown.child_token())
                .await;
            if let Ok(summary) = &result {
                state.tracker.record(Trigger::Manual, summary).await;
            }
            result
        }
    });

    let result = match run.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Manual sync task failed");
            return internal_error(e.to_string());
        }
    };

    match result {
        Ok(summary) => (
            StatusCode::ACCEPTED,
            Json(SyncResponse::new(&summary, triggered_at)),
        )
            .into_response(),
        Err(SyncError::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                message: SyncError::AlreadyRunning.to_string(),
                errors: Vec::new(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Manual sync failed");
            internal_error(e.to_string())
        }
    }
}

fn internal_error(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: "Weather sync failed".to_string(),
            errors: vec![error],
        }),
    )
        .into_response()
}

/// GET /status - Whether a batch is running and the last result
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    Json(StatusResponse {
        running: state.orchestrator.is_syncing(),
        completed_runs: state.tracker.completed_runs().await,
        last_run: state.tracker.last_run().await,
    })
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "weather-sync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus metrics
async fn metrics_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/sync", post(sync_handler))
        .route("/api/weather-sync", post(sync_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server; returns once the shutdown token fires.
pub async fn start_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port = port, "Starting weather-sync HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

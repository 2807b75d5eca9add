//! Weather sync service.
//!
//! Fetches Meteoblue forecasts for every registered launch site once a day
//! and on demand, storing each response as an immutable snapshot.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ingestion::{IngestionOrchestrator, MeteoblueClient};
use storage::Database;
use weather_sync::config::Args;
use weather_sync::scheduler::{DailySchedule, Scheduler};
use weather_sync::server::{self, ServerState};
use weather_sync::tracker::{RunTracker, Trigger};
use weather_sync::{logging, sites_file};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_format)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting weather sync service");

    let db = Database::open(&args.database)
        .await
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;

    if let Some(path) = &args.sites_file {
        sites_file::seed(&db.sites(), path)
            .await
            .with_context(|| format!("Failed to load sites from {}", path.display()))?;
    }

    let provider =
        MeteoblueClient::new(args.meteoblue_config()).context("Failed to create Meteoblue client")?;
    let config = args.ingestion_config();
    info!(
        default_elevation = config.default_elevation,
        max_concurrent = config.max_concurrent,
        sync_at = %args.sync_at,
        "Loaded configuration"
    );

    let orchestrator = Arc::new(IngestionOrchestrator::new(
        Arc::new(db.sites()),
        Arc::new(provider),
        Arc::new(db.snapshots()),
        config,
    ));
    let tracker = Arc::new(RunTracker::new());

    // Shutdown signal
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            shutdown.cancel();
        }
    });

    if args.once {
        info!("Running single weather sync");
        let summary = orchestrator
            .sync_once_until(shutdown.child_token())
            .await
            .context("Weather sync failed")?;
        tracker.record(Trigger::Startup, &summary).await;

        for failure in &summary.failed {
            warn!(
                site_id = %failure.site_id,
                kind = failure.error.kind(),
                error = %failure.error,
                "Site failed"
            );
        }
        println!(
            "attempted={} succeeded={} failed={} cancelled={}",
            summary.attempted,
            summary.succeeded,
            summary.failed.len(),
            summary.cancelled
        );
        return Ok(());
    }

    let scheduler_task = if args.no_scheduler {
        info!("Daily scheduler disabled");
        None
    } else {
        let scheduler = Scheduler::new(
            orchestrator.clone(),
            tracker.clone(),
            DailySchedule::new(args.sync_at),
        );
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move { scheduler.run_forever(shutdown).await }))
    };

    let state = Arc::new(ServerState {
        orchestrator,
        tracker,
        metrics: Some(prometheus_handle),
        shutdown: shutdown.clone(),
    });

    let served = server::start_server(state, args.port).await;
    if let Err(e) = &served {
        error!(error = %e, "HTTP server failed");
        shutdown.cancel();
    }

    if let Some(task) = scheduler_task {
        task.await.ok();
    }

    info!("Weather sync service stopped");
    served
}

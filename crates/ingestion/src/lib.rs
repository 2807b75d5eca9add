//! Weather ingestion library.
//!
//! Fetches forecasts for registered launch sites from an external provider
//! and stores them as immutable snapshots.
//!
//! # Architecture
//!
//! - [`WeatherProvider`]: one forecast fetch for a coordinate, with a single
//!   error taxonomy ([`ProviderError`]). [`MeteoblueClient`] is the production
//!   implementation.
//! - [`IngestionOrchestrator`]: per-site `fetch_and_store` and the
//!   whole-registry `sync_once` batch, which isolates per-site failures and
//!   refuses to run twice at the same time.

pub mod config;
pub mod error;
pub mod meteoblue;
pub mod orchestrator;
pub mod provider;
pub mod summary;

// Re-exports
pub use config::IngestionConfig;
pub use error::{IngestionError, ProviderError, Result, SyncError};
pub use meteoblue::{MeteoblueClient, MeteoblueConfig};
pub use orchestrator::IngestionOrchestrator;
pub use provider::WeatherProvider;
pub use summary::{SiteFailure, SyncSummary};

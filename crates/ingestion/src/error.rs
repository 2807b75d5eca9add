//! Error types for the ingestion crate.

use thiserror::Error;

use storage::StorageError;
use weather_common::SiteId;

/// Failures of a single provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Timeout, connection failure, or the body could not be read
    #[error("Provider request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status
    #[error("Provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The body does not match the forecast schema
    #[error("Failed to decode provider payload: {0}")]
    Decode(String),
}

/// Errors from ingesting a single site.
#[derive(Error, Debug, Clone)]
pub enum IngestionError {
    #[error("Launch site not found: {0}")]
    SiteNotFound(SiteId),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to persist snapshot: {0}")]
    Persistence(#[from] StorageError),
}

impl IngestionError {
    /// Stable tag for logs, metrics and HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::SiteNotFound(_) => "site_not_found",
            IngestionError::Provider(ProviderError::Transport(_)) => "provider_transport",
            IngestionError::Provider(ProviderError::HttpStatus(_)) => "provider_http_status",
            IngestionError::Provider(ProviderError::Decode(_)) => "provider_decode",
            IngestionError::Persistence(_) => "persistence",
        }
    }
}

/// Errors that prevent a batch run from happening at all.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    #[error("sync already running")]
    AlreadyRunning,

    #[error("Failed to list launch sites: {0}")]
    Registry(StorageError),
}

/// Result type for single-site ingestion.
pub type Result<T> = std::result::Result<T, IngestionError>;

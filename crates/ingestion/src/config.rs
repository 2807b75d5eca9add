//! Orchestrator settings.

use weather_common::DEFAULT_SCHEMA_VERSION;

/// Elevation (m ASL) used for sites that do not record one.
pub const DEFAULT_ELEVATION: i32 = 171;

/// Default number of sites fetched concurrently during a batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Settings for [`IngestionOrchestrator`](crate::IngestionOrchestrator).
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Elevation passed to the provider when a site has none
    pub default_elevation: i32,
    /// Upper bound on concurrent per-site fetches in a batch
    pub max_concurrent: usize,
    /// Schema version tagged onto new snapshots
    pub schema_version: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            default_elevation: DEFAULT_ELEVATION,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }
}

impl IngestionConfig {
    pub fn with_default_elevation(mut self, elevation: i32) -> Self {
        self.default_elevation = elevation;
        self
    }

    /// Values below 1 are treated as 1.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }
}

//! Weather provider abstraction.

use async_trait::async_trait;

use weather_common::ForecastPayload;

use crate::error::ProviderError;

/// Fetches a raw forecast for a coordinate from an external service.
///
/// Implementations translate every transport, status and decode failure
/// into [`ProviderError`]. They neither validate coordinates nor retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Name recorded on snapshots, e.g. "meteoblue".
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        elevation_asl: i32,
    ) -> Result<ForecastPayload, ProviderError>;
}

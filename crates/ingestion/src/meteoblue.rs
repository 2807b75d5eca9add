//! Meteoblue forecast client.
//!
//! Calls the `multimodel-1h` package:
//! `GET {base_url}/packages/multimodel-1h?apikey=..&lat=..&lon=..&asl=..&format=json`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, instrument, warn};

use weather_common::ForecastPayload;

use crate::error::ProviderError;
use crate::provider::WeatherProvider;

/// Provider name recorded on snapshots.
pub const PROVIDER_NAME: &str = "meteoblue";

pub const DEFAULT_BASE_URL: &str = "https://my.meteoblue.com";

const PACKAGE_PATH: &str = "/packages/multimodel-1h";

/// Configuration for the Meteoblue client.
#[derive(Clone)]
pub struct MeteoblueConfig {
    /// Scheme and host, without the package path
    pub base_url: String,
    pub api_key: String,
    /// Bound on a whole request, connect to last body byte
    pub timeout: Duration,
}

impl MeteoblueConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Keeps the api key out of logs.
impl fmt::Debug for MeteoblueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeteoblueConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the Meteoblue forecast API.
pub struct MeteoblueClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl MeteoblueClient {
    pub fn new(config: MeteoblueConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), PACKAGE_PATH);

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WeatherProvider for MeteoblueClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        elevation_asl: i32,
    ) -> Result<ForecastPayload, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.clone()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("asl", elevation_asl.to_string()),
                ("format", "json".to_string()),
            ])
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Meteoblue request failed");
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!(bytes = bytes.len(), "Received Meteoblue forecast");

        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| ProviderError::Decode(format!("body is not UTF-8: {}", e)))?;

        ForecastPayload::from_json(body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// The request URL carries the api key, so it is stripped from the message.
fn transport_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Transport(format!("request timed out: {}", err))
    } else {
        ProviderError::Transport(err.to_string())
    }
}

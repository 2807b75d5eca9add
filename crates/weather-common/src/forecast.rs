//! Meteoblue `multimodel-1h` forecast payload.
//!
//! The provider body is kept verbatim so a persisted snapshot reads back
//! byte-for-byte; the decoded form is only used to check the schema and
//! for convenient access.

use serde::{Deserialize, Serialize};

/// A raw provider response that decoded as a Meteoblue forecast.
#[derive(Debug, Clone)]
pub struct ForecastPayload {
    raw: String,
    forecast: MeteoblueForecast,
}

impl ForecastPayload {
    /// Decode a JSON body, keeping the original text.
    pub fn from_json(raw: impl Into<String>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let forecast = serde_json::from_str(&raw)?;
        Ok(Self { raw, forecast })
    }

    /// The body exactly as received from the provider.
    pub fn as_json(&self) -> &str {
        &self.raw
    }

    pub fn forecast(&self) -> &MeteoblueForecast {
        &self.forecast
    }

    pub fn into_json(self) -> String {
        self.raw
    }
}

impl PartialEq for ForecastPayload {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// Top-level `multimodel-1h` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoblueForecast {
    pub metadata: Metadata,
    #[serde(default)]
    pub units: Option<Units>,
    pub data_1h: HourlyData,
}

/// Forecast metadata (model runs, location echo, timing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    /// Location echo; 0.0 when the body omits it
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Elevation the forecast was computed for (m)
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub timezone_abbrevation: Option<String>,
    /// Hours offset from UTC
    #[serde(default)]
    pub utc_timeoffset: Option<f64>,
    #[serde(default)]
    pub modelrun_utc: Vec<String>,
    #[serde(default)]
    pub modelrun_updatetime_utc: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, rename = "gridpointelevation")]
    pub gridpoint_elevation: Vec<i32>,
    #[serde(default)]
    pub generation_time_ms: Option<f64>,
}

/// Unit labels for the hourly series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub precipitation: Option<String>,
    pub windspeed: Option<String>,
    pub cloudcover: Option<String>,
    pub radiation: Option<String>,
    pub time: Option<String>,
    pub temperature: Option<String>,
    pub relativehumidity: Option<String>,
    pub winddirection: Option<String>,
}

/// Hourly series. Nested vectors hold one series per model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyData {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_spread: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub cloudcover: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub temperature: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub winddirection: Vec<Vec<Option<f64>>>,
}

impl HourlyData {
    /// Number of forecast time steps.
    pub fn steps(&self) -> usize {
        self.time.len()
    }
}

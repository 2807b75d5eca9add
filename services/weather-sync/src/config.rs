//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use clap::{Parser, ValueEnum};

use ingestion::config::{DEFAULT_ELEVATION, DEFAULT_MAX_CONCURRENT};
use ingestion::meteoblue::DEFAULT_BASE_URL;
use ingestion::{IngestionConfig, MeteoblueConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "weather-sync")]
#[command(about = "Fetches Meteoblue forecasts for launch sites daily and on demand")]
pub struct Args {
    /// SQLite database file
    #[arg(long, env = "WEATHER_SYNC_DATABASE", default_value = "/data/weather-sync/weather.db")]
    pub database: PathBuf,

    /// YAML file of launch sites to register at startup
    #[arg(long, env = "SITES_FILE")]
    pub sites_file: Option<PathBuf>,

    /// Meteoblue API base URL
    #[arg(long, env = "METEOBLUE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub meteoblue_base_url: String,

    /// Meteoblue API key
    #[arg(long, env = "METEOBLUE_API_KEY", hide_env_values = true)]
    pub meteoblue_api_key: String,

    /// Timeout for a single forecast request
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Elevation (m) used for sites without one
    #[arg(long, env = "DEFAULT_ELEVATION", default_value_t = DEFAULT_ELEVATION)]
    pub default_elevation: i32,

    /// Maximum sites fetched concurrently
    #[arg(long, env = "MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,

    /// Daily sync time, HH:MM in UTC
    #[arg(long, env = "SYNC_AT", default_value = "00:00", value_parser = parse_sync_time)]
    pub sync_at: NaiveTime,

    /// Port for the HTTP server
    #[arg(long, env = "HTTP_PORT", default_value_t = 8084)]
    pub port: u16,

    /// Run a single batch and exit
    #[arg(long)]
    pub once: bool,

    /// Disable the daily trigger
    #[arg(long)]
    pub no_scheduler: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig::default()
            .with_default_elevation(self.default_elevation)
            .with_max_concurrent(self.max_concurrent)
    }

    pub fn meteoblue_config(&self) -> MeteoblueConfig {
        MeteoblueConfig::new(self.meteoblue_api_key.clone())
            .with_base_url(self.meteoblue_base_url.clone())
            .with_timeout(Duration::from_secs(self.provider_timeout_secs))
    }
}

/// Parse `HH:MM` (24h).
pub fn parse_sync_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got '{}': {}", value, e))
}

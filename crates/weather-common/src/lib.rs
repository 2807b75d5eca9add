//! Common types shared across the launch site weather services.
//!
//! - [`Site`] is the read-only view of a registered launch site.
//! - [`ForecastPayload`] carries a provider response verbatim together with
//!   its decoded Meteoblue forecast.
//! - [`SnapshotDraft`] and [`WeatherSnapshot`] describe an ingested forecast
//!   before and after persistence.

pub mod error;
pub mod forecast;
pub mod site;
pub mod snapshot;

pub use error::SiteValidationError;
pub use forecast::{ForecastPayload, HourlyData, MeteoblueForecast, Metadata, Units};
pub use site::{Site, SiteId};
pub use snapshot::{SnapshotDraft, SnapshotId, WeatherSnapshot, DEFAULT_SCHEMA_VERSION};

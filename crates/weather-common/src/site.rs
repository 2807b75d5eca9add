//! Launch site identity and coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SiteValidationError;

/// Unique identifier of a launch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(Uuid);

impl SiteId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SiteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A registered launch site as seen by weather ingestion.
///
/// Sites are owned by the launch site registry; ingestion only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    /// Degrees north, WGS84
    pub latitude: f64,
    /// Degrees east, WGS84
    pub longitude: f64,
    /// Meters above sea level
    #[serde(default)]
    pub elevation: Option<i32>,
}

impl Site {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: SiteId::new(),
            name: name.into(),
            latitude,
            longitude,
            elevation: None,
        }
    }

    pub fn with_elevation(mut self, elevation: i32) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Check name and coordinate ranges.
    pub fn validate(&self) -> Result<(), SiteValidationError> {
        if self.name.trim().is_empty() {
            return Err(SiteValidationError::BlankName);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SiteValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SiteValidationError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Elevation to query the provider with, falling back to `default`.
    pub fn elevation_or(&self, default: i32) -> i32 {
        self.elevation.unwrap_or(default)
    }
}

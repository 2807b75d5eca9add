//! Ingested weather snapshots.
//!
//! A snapshot is written once per successful provider fetch and never
//! modified afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forecast::ForecastPayload;
use crate::site::SiteId;

/// Schema version applied when a draft does not name one.
pub const DEFAULT_SCHEMA_VERSION: &str = "v1";

/// Identifier generated by the snapshot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SnapshotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A snapshot that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDraft {
    /// Provider name, e.g. "meteoblue"
    pub provider: String,
    pub schema_version: Option<String>,
    pub site_id: SiteId,
    pub payload: ForecastPayload,
}

impl SnapshotDraft {
    pub fn new(provider: impl Into<String>, site_id: SiteId, payload: ForecastPayload) -> Self {
        Self {
            provider: provider.into(),
            schema_version: None,
            site_id,
            payload,
        }
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = Some(version.into());
        self
    }

    /// The schema version to persist; never empty.
    pub fn schema_version(&self) -> &str {
        self.schema_version
            .as_deref()
            .unwrap_or(DEFAULT_SCHEMA_VERSION)
    }
}

/// A persisted, immutable forecast snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub id: SnapshotId,
    pub provider: String,
    pub schema_version: String,
    pub site_id: SiteId,
    pub payload: ForecastPayload,
    /// Assigned by the store at persistence time
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Complete a draft with store-assigned identity and timestamp.
    pub fn from_draft(draft: SnapshotDraft, id: SnapshotId, fetched_at: DateTime<Utc>) -> Self {
        let schema_version = draft.schema_version().to_string();
        Self {
            id,
            provider: draft.provider,
            schema_version,
            site_id: draft.site_id,
            payload: draft.payload,
            fetched_at,
        }
    }
}

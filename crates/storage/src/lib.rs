//! Storage for the weather ingestion services.
//!
//! Provides:
//! - [`SiteRegistry`]: read access to registered launch sites
//! - [`SnapshotStore`]: append-only persistence of forecast snapshots
//! - SQLite implementations of both sharing one connection pool

pub mod database;
pub mod error;
pub mod sites;
pub mod snapshots;

pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use sites::{SiteCatalog, SiteRegistry};
pub use snapshots::{SnapshotCatalog, SnapshotStore};

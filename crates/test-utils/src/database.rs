//! Temporary SQLite databases.

use tempfile::TempDir;

use storage::{Database, StorageResult};

/// A database file inside a temporary directory that is removed on drop.
pub struct TempDatabase {
    pub db: Database,
    _dir: TempDir,
}

impl TempDatabase {
    pub async fn new() -> StorageResult<Self> {
        let dir = tempfile::tempdir()?;
        let db = Database::open(&dir.path().join("weather.db")).await?;
        Ok(Self { db, _dir: dir })
    }
}

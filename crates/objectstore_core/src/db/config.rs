//! Store connection settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the SQLite database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLocation {
    /// Private in-memory database, discarded when the connection closes.
    #[default]
    Memory,
    /// Database file on disk, created when missing.
    File { path: PathBuf },
}

/// Connection settings applied by [`crate::db::open_store`].
///
/// Every field has a default, so a partial document such as
/// `{"location": {"kind": "file", "path": "/tmp/app.db"}}` deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File { path: path.into() },
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub(crate) fn mode(&self) -> &'static str {
        match self.location {
            StoreLocation::Memory => "memory",
            StoreLocation::File { .. } => "file",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

//! Store configuration.
//!
//! A [`StoreConfig`] can be loaded from TOML or assembled with
//! [`crate::StoreBuilder`]. Every field has a default, so an empty file is
//! a valid in-memory optimistic store.
//!
//! ```toml
//! backend = "sqlite"
//! path = "./records.db"
//! mode = "optimistic"
//! schema = "versioned"
//! migration = "create_if_missing"
//! busy_timeout_ms = 5000
//! journal_mode = "wal"
//! ```

use crate::error::{Error, Result};
use recordstore_primitives::ConcurrencyMode;
use recordstore_storage::{JournalMode, Schema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// In-process table, discarded when the store is dropped
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

/// What opening a store does to the records table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPolicy {
    /// Create the table if missing, keep existing records
    #[default]
    CreateIfMissing,
    /// Drop and recreate the table, discarding existing records
    Recreate,
    /// Leave the table alone
    None,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: Backend,
    /// Database file; required for the SQLite backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Concurrency mode
    pub mode: ConcurrencyMode,
    /// Table layout
    pub schema: Schema,
    /// Migration run when the store opens
    pub migration: MigrationPolicy,
    /// How long SQLite waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// How long the memory backend waits for its writer lease, in milliseconds
    pub lock_timeout_ms: u64,
    /// SQLite journal mode
    pub journal_mode: JournalMode,
    /// Idle SQLite connections kept for reuse
    pub max_idle_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            path: None,
            mode: ConcurrencyMode::Optimistic,
            schema: Schema::Versioned,
            migration: MigrationPolicy::CreateIfMissing,
            busy_timeout_ms: 5_000,
            lock_timeout_ms: 5_000,
            journal_mode: JournalMode::Wal,
            max_idle_connections: 4,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check that the settings fit together
    pub fn validate(&self) -> Result<()> {
        if self.mode == ConcurrencyMode::Optimistic && !self.schema.has_version() {
            return Err(Error::Config(
                "optimistic mode requires the versioned schema".to_string(),
            ));
        }
        if self.backend == Backend::Sqlite && self.path.is_none() {
            return Err(Error::Config("sqlite backend requires a path".to_string()));
        }
        if self.max_idle_connections == 0 {
            return Err(Error::Config(
                "max_idle_connections must be at least 1".to_string(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(Error::Config("lock_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// SQLite busy timeout
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Memory backend writer-lease timeout
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

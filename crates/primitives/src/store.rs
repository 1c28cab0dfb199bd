//! The store interface shared by both concurrency modes

use recordstore_core::{Context, Record, RecordKey, Result};
use serde::{Deserialize, Serialize};

/// How a store handles concurrent saves of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Saves of existing records compare version tokens; stale saves fail
    #[default]
    Optimistic,
    /// Saves overwrite unconditionally; the later write wins
    LastWriteWins,
}

impl std::fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcurrencyMode::Optimistic => write!(f, "optimistic"),
            ConcurrencyMode::LastWriteWins => write!(f, "last_write_wins"),
        }
    }
}

/// Persistent store of [`Record`]s
///
/// Object safe, so a facade can hold either store behind `dyn RecordStore`.
pub trait RecordStore: Send + Sync {
    /// Concurrency mode of this store
    fn mode(&self) -> ConcurrencyMode;

    /// Record stored under `key`
    ///
    /// # Errors
    /// [`recordstore_core::StoreError::NotFound`] if no record has that key.
    fn find(&self, ctx: &Context, key: &RecordKey) -> Result<Record>;

    /// Insert a keyless record or update an existing one
    ///
    /// On success the assigned key and version are written back into
    /// `record`. On failure `record` is left as it was.
    fn save(&self, ctx: &Context, record: &mut Record) -> Result<()>;

    /// Delete the record at `key`; returns whether a record was removed
    fn delete(&self, ctx: &Context, key: &RecordKey) -> Result<bool>;

    /// Every record, in storage order
    fn list(&self, ctx: &Context) -> Result<Vec<Record>>;

    /// Drop and recreate the records table, discarding every record
    fn migrate(&self, ctx: &Context) -> Result<()>;

    /// Create the records table if it does not exist
    fn ensure_schema(&self, ctx: &Context) -> Result<()>;
}

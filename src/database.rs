//! Main entry point for recordstore.
//!
//! This module provides the `Store` struct, the handle all record
//! operations go through, and the builder that opens it.

use crate::config::{Backend, MigrationPolicy, StoreConfig};
use crate::error::Result;
use recordstore_core::{Context, Record, RecordKey};
use recordstore_primitives::{ConcurrencyMode, LastWriteWinsStore, RecordStore, VersionedStore};
use recordstore_storage::{JournalMode, MemoryRepository, Repository, Schema, SqliteConfig, SqliteRepository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A record store.
///
/// Create one with [`Store::open`], [`Store::ephemeral`] or
/// [`Store::builder`]. Cloning is cheap and every clone shares the same
/// records, so a store can be handed to many threads.
///
/// # Example
///
/// ```ignore
/// use recordstore::prelude::*;
///
/// let store = Store::open("./records.db")?;
/// let ctx = Context::new();
///
/// let mut record = Record::new("hello", "world");
/// store.save(&ctx, &mut record)?;
///
/// let found = store.find(&ctx, record.key.as_ref().unwrap())?;
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn RecordStore>,
    backend: Backend,
    path: Option<PathBuf>,
}

impl Store {
    /// Open an optimistic store backed by the SQLite file at `path`.
    ///
    /// Creates the file and the records table if they do not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an optimistic store that lives only in memory.
    ///
    /// All records are gone when the last clone is dropped.
    pub fn ephemeral() -> Result<Self> {
        Self::builder().ephemeral().open()
    }

    /// Create a builder for store configuration.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Record stored under `key`
    pub fn find(&self, ctx: &Context, key: &RecordKey) -> Result<Record> {
        Ok(self.inner.find(ctx, key)?)
    }

    /// Insert a keyless record or update an existing one.
    ///
    /// The assigned key and version are written back into `record` on
    /// success. In optimistic mode a stale version fails with
    /// [`crate::Error::Conflict`].
    pub fn save(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        Ok(self.inner.save(ctx, record)?)
    }

    /// Delete the record at `key`; returns whether one was removed
    pub fn delete(&self, ctx: &Context, key: &RecordKey) -> Result<bool> {
        Ok(self.inner.delete(ctx, key)?)
    }

    /// Every record, in storage order
    pub fn list(&self, ctx: &Context) -> Result<Vec<Record>> {
        Ok(self.inner.list(ctx)?)
    }

    /// Drop and recreate the records table. Destroys every record.
    pub fn migrate(&self, ctx: &Context) -> Result<()> {
        Ok(self.inner.migrate(ctx)?)
    }

    /// Create the records table if it does not exist
    pub fn ensure_schema(&self, ctx: &Context) -> Result<()> {
        Ok(self.inner.ensure_schema(ctx)?)
    }

    /// Concurrency mode of this store
    pub fn mode(&self) -> ConcurrencyMode {
        self.inner.mode()
    }

    /// Storage backend of this store
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Database file, `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check if this is an in-memory store
    pub fn is_ephemeral(&self) -> bool {
        self.backend == Backend::Memory
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("mode", &self.mode())
            .field("backend", &self.backend)
            .field("path", &self.path)
            .finish()
    }
}

/// Builder for store configuration.
///
/// Starts from [`StoreConfig::default`]: in memory, optimistic, versioned
/// schema, table created if missing.
///
/// # Example
///
/// ```ignore
/// // Disk-backed, last-write-wins over the baseline table
/// let store = Store::builder()
///     .path("./records.db")
///     .last_write_wins()
///     .baseline_schema()
///     .open()?;
///
/// // In memory, fail fast on a busy writer
/// let store = Store::builder()
///     .ephemeral()
///     .lock_timeout(Duration::from_millis(100))
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    config: StoreConfig,
}

impl StoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Current settings
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Use the SQLite file at `path`.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.backend = Backend::Sqlite;
        self.config.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep records in memory only.
    pub fn ephemeral(mut self) -> Self {
        self.config.backend = Backend::Memory;
        self.config.path = None;
        self
    }

    /// Detect stale saves with version tokens (default).
    pub fn optimistic(mut self) -> Self {
        self.config.mode = ConcurrencyMode::Optimistic;
        self
    }

    /// Overwrite unconditionally; concurrent updates can be lost.
    pub fn last_write_wins(mut self) -> Self {
        self.config.mode = ConcurrencyMode::LastWriteWins;
        self
    }

    /// Use the table layout without a version column.
    ///
    /// Only valid with [`StoreBuilder::last_write_wins`].
    pub fn baseline_schema(mut self) -> Self {
        self.config.schema = Schema::Baseline;
        self
    }

    /// How long SQLite waits on a locked database.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout_ms = millis(timeout);
        self
    }

    /// How long the memory backend waits for its writer lease.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout_ms = millis(timeout);
        self
    }

    /// SQLite journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.config.journal_mode = mode;
        self
    }

    /// Migration run on open.
    pub fn migration(mut self, policy: MigrationPolicy) -> Self {
        self.config.migration = policy;
        self
    }

    /// Open the store.
    ///
    /// Validates the settings, opens the backend and runs the configured
    /// migration.
    pub fn open(self) -> Result<Store> {
        let config = self.config;
        config.validate()?;

        let inner = match config.backend {
            Backend::Memory => {
                let repo = MemoryRepository::with_lock_timeout(config.schema, config.lock_timeout());
                build_store(repo, config.mode)?
            }
            Backend::Sqlite => {
                let path = config.path.clone().ok_or_else(|| {
                    crate::Error::Config("sqlite backend requires a path".to_string())
                })?;
                let mut sqlite = SqliteConfig::new(path)
                    .schema(config.schema)
                    .busy_timeout(config.busy_timeout())
                    .journal_mode(config.journal_mode);
                sqlite.max_idle_connections = config.max_idle_connections;
                build_store(SqliteRepository::open(sqlite)?, config.mode)?
            }
        };

        let ctx = Context::new();
        match config.migration {
            MigrationPolicy::CreateIfMissing => inner.ensure_schema(&ctx)?,
            MigrationPolicy::Recreate => inner.migrate(&ctx)?,
            MigrationPolicy::None => {}
        }

        info!(
            backend = ?config.backend,
            mode = %config.mode,
            schema = ?config.schema,
            migration = ?config.migration,
            "opened record store"
        );
        Ok(Store {
            inner,
            backend: config.backend,
            path: config.path,
        })
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

fn build_store<R>(repo: R, mode: ConcurrencyMode) -> Result<Arc<dyn RecordStore>>
where
    R: Repository + 'static,
{
    let store: Arc<dyn RecordStore> = match mode {
        ConcurrencyMode::Optimistic => Arc::new(VersionedStore::new(repo)?),
        ConcurrencyMode::LastWriteWins => Arc::new(LastWriteWinsStore::new(repo)),
    };
    Ok(store)
}

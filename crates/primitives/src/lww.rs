//! Last-write-wins record store
//!
//! ## Design
//!
//! LastWriteWinsStore is a stateless facade over a repository. Updates are
//! unconditional: two callers that read the same record and both save will
//! both succeed, and the later save silently discards the earlier one. It
//! exists as the baseline the versioned store is measured against.

use crate::rows::{find_with, to_record, to_row};
use crate::store::{ConcurrencyMode, RecordStore};
use recordstore_core::error::ensure_single_row;
use recordstore_core::{Context, Record, RecordKey, Result, VersionToken};
use recordstore_storage::{MigrationMode, Repository};
use tracing::{debug, info};

/// Record store with no conflict detection
///
/// # Example
///
/// ```ignore
/// use recordstore_primitives::{LastWriteWinsStore, RecordStore};
/// use recordstore_storage::{MemoryRepository, Schema};
///
/// let store = LastWriteWinsStore::new(MemoryRepository::new(Schema::Baseline));
/// let ctx = Context::new();
/// store.ensure_schema(&ctx)?;
///
/// let mut record = Record::new("hello", "world");
/// store.save(&ctx, &mut record)?;
/// ```
#[derive(Debug, Clone)]
pub struct LastWriteWinsStore<R> {
    repo: R,
}

impl<R: Repository> LastWriteWinsStore<R> {
    /// Create a store over `repo`
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The underlying repository
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Insert a keyless record under a fresh key
    ///
    /// A version token is generated only when the repository stores one.
    pub(crate) fn insert_new(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        let key = RecordKey::generate();
        let version = self
            .repo
            .schema()
            .has_version()
            .then(VersionToken::generate);

        let row = to_row(record, key.clone(), version.clone());
        let affected = self.repo.insert_row(ctx, &row)?;
        ensure_single_row("insert", affected)?;

        debug!(key = %key, "inserted record");
        record.key = Some(key);
        record.version = version;
        Ok(())
    }

    fn overwrite(&self, ctx: &Context, key: RecordKey, record: &Record) -> Result<()> {
        let row = to_row(record, key, record.version.clone());
        let affected = self.repo.update_row_by_key(ctx, &row)?;
        ensure_single_row("update", affected)?;
        debug!(key = %row.key, "overwrote record");
        Ok(())
    }
}

impl<R: Repository> RecordStore for LastWriteWinsStore<R> {
    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::LastWriteWins
    }

    fn find(&self, ctx: &Context, key: &RecordKey) -> Result<Record> {
        find_with(&self.repo, ctx, key).map(to_record)
    }

    fn save(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        match record.key.clone() {
            Some(key) if !key.as_str().is_empty() => self.overwrite(ctx, key, record),
            _ => self.insert_new(ctx, record),
        }
    }

    fn delete(&self, ctx: &Context, key: &RecordKey) -> Result<bool> {
        let affected = self.repo.delete_row_by_key(ctx, key)?;
        debug!(key = %key, removed = affected > 0, "deleted record");
        Ok(affected > 0)
    }

    fn list(&self, ctx: &Context) -> Result<Vec<Record>> {
        Ok(self
            .repo
            .scan_all(ctx)?
            .into_iter()
            .map(to_record)
            .collect())
    }

    fn migrate(&self, ctx: &Context) -> Result<()> {
        self.repo.migrate(ctx, MigrationMode::Recreate)?;
        info!(mode = %self.mode(), "recreated records table");
        Ok(())
    }

    fn ensure_schema(&self, ctx: &Context) -> Result<()> {
        self.repo.migrate(ctx, MigrationMode::CreateIfMissing)
    }
}

//! Optimistic-concurrency record store
//!
//! ## Design
//!
//! VersionedStore wraps a [`LastWriteWinsStore`] and overrides only `save`.
//! Every other operation is delegated unchanged.
//!
//! Saving an existing record is a compare-and-swap on its version token:
//!
//! ```text
//! begin (serializable)
//!   current = find(key)                 NotFound if gone
//!   current.version != record.version   Conflict, rolled back
//!   update title, content, new version  exactly one row
//! commit
//! ```
//!
//! The whole sequence runs in one serializable transaction, so two savers
//! holding the same version are linearized: the second one re-reads the
//! first one's token and fails with a conflict. Conflicts are never retried
//! here; the caller decides whether to re-read and try again.

use crate::lww::LastWriteWinsStore;
use crate::rows::{find_with, to_row};
use crate::store::{ConcurrencyMode, RecordStore};
use recordstore_concurrency::{validate_version, TransactionGuard};
use recordstore_core::error::ensure_single_row;
use recordstore_core::{Context, Record, RecordKey, Result, StoreError, VersionToken};
use recordstore_storage::{IsolationLevel, Repository};
use tracing::debug;

/// Isolation every versioned save runs at
pub const SAVE_ISOLATION: IsolationLevel = IsolationLevel::Serializable;

/// Record store that rejects stale saves
///
/// # Example
///
/// ```ignore
/// use recordstore_primitives::{RecordStore, VersionedStore};
/// use recordstore_storage::{MemoryRepository, Schema};
///
/// let store = VersionedStore::new(MemoryRepository::new(Schema::Versioned))?;
/// let ctx = Context::new();
/// store.ensure_schema(&ctx)?;
///
/// let mut record = Record::new("hello", "world");
/// store.save(&ctx, &mut record)?;
///
/// let mut stale = record.clone();
/// record.content = "first".into();
/// store.save(&ctx, &mut record)?;
///
/// stale.content = "second".into();
/// assert!(store.save(&ctx, &mut stale).unwrap_err().is_conflict());
/// ```
#[derive(Debug, Clone)]
pub struct VersionedStore<R> {
    inner: LastWriteWinsStore<R>,
}

impl<R: Repository> VersionedStore<R> {
    /// Create a store over `repo`
    ///
    /// # Errors
    /// `Storage` if the repository's schema has no version column.
    pub fn new(repo: R) -> Result<Self> {
        if !repo.schema().has_version() {
            return Err(StoreError::storage_msg(
                "versioned store requires a repository with a version column",
            ));
        }
        Ok(Self {
            inner: LastWriteWinsStore::new(repo),
        })
    }

    /// The underlying repository
    pub fn repository(&self) -> &R {
        self.inner.repository()
    }

    fn compare_and_swap(&self, ctx: &Context, key: RecordKey, record: &mut Record) -> Result<()> {
        let txn = self.repository().begin(ctx, SAVE_ISOLATION)?;
        let mut guard = TransactionGuard::new(txn, key.clone());

        ctx.check()?;
        let current = find_with(&guard, ctx, &key)?;

        if let Err(e) = validate_version(&key, record.version.as_ref(), current.version.as_ref()) {
            guard.abort("version mismatch");
            return Err(e);
        }

        let version = VersionToken::generate();
        let row = to_row(record, key, Some(version.clone()));
        ctx.check()?;
        let affected = guard.update_row_by_key(ctx, &row)?;
        ensure_single_row("update", affected)?;

        ctx.check()?;
        guard.commit(ctx)?;

        debug!(key = %row.key, version = %version, "saved record");
        record.version = Some(version);
        Ok(())
    }
}

impl<R: Repository> RecordStore for VersionedStore<R> {
    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Optimistic
    }

    fn find(&self, ctx: &Context, key: &RecordKey) -> Result<Record> {
        self.inner.find(ctx, key)
    }

    fn save(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        match record.key.clone() {
            Some(key) if !key.as_str().is_empty() => self.compare_and_swap(ctx, key, record),
            // A fresh key cannot collide, so inserts need no transaction
            _ => self.inner.insert_new(ctx, record),
        }
    }

    fn delete(&self, ctx: &Context, key: &RecordKey) -> Result<bool> {
        self.inner.delete(ctx, key)
    }

    fn list(&self, ctx: &Context) -> Result<Vec<Record>> {
        self.inner.list(ctx)
    }

    fn migrate(&self, ctx: &Context) -> Result<()> {
        self.inner.migrate(ctx)
    }

    fn ensure_schema(&self, ctx: &Context) -> Result<()> {
        self.inner.ensure_schema(ctx)
    }
}

//! In-process repository
//!
//! # Design
//!
//! - Rows live in a `RwLock<Table>`: readers never wait on writers.
//! - One [`WriterLease`] serializes every writer. Plain writes hold it for
//!   the single statement.
//! - A serializable transaction takes the lease at `begin` and keeps it
//!   until commit or rollback, so its read-compare-write cannot interleave
//!   with another writer.
//! - A read-committed transaction stages its writes and only takes the
//!   lease to apply them at commit.
//!
//! Nothing touches disk; dropping the last handle discards every row.

mod lease;
mod table;

use crate::repository::{IsolationLevel, KeyLookup, MigrationMode, RepoTransaction, Repository, Row, Schema};
use lease::{WriterLease, WriterLock};
use parking_lot::RwLock;
use recordstore_core::{Context, RecordKey, Result, StoreError};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use table::Table;
use tracing::{debug, info};

/// Default bound on waiting for the writer lease
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-process repository
///
/// Cloning shares the underlying table.
///
/// # Example
///
/// ```ignore
/// use recordstore_storage::{MemoryRepository, MigrationMode, Repository, Schema};
///
/// let repo = MemoryRepository::new(Schema::Versioned);
/// repo.migrate(&Context::new(), MigrationMode::CreateIfMissing)?;
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    table: Arc<RwLock<Table>>,
    writer: Arc<WriterLock>,
    schema: Schema,
    lock_timeout: Duration,
}

impl MemoryRepository {
    /// Create an empty repository; the table does not exist until migrated
    pub fn new(schema: Schema) -> Self {
        Self::with_lock_timeout(schema, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create with a custom bound on waiting for the writer lease
    pub fn with_lock_timeout(schema: Schema, lock_timeout: Duration) -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
            writer: Arc::new(WriterLock::default()),
            schema,
            lock_timeout,
        }
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Check if the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lease(&self, ctx: &Context) -> Result<WriterLease> {
        self.writer.acquire(ctx, self.lock_timeout)
    }
}

/// Fit a row to the schema: baseline rows never carry a version, versioned
/// inserts must.
fn shape_row(schema: Schema, row: &Row, inserting: bool) -> Result<Row> {
    let mut shaped = row.clone();
    match schema {
        Schema::Baseline => shaped.version = None,
        Schema::Versioned => {
            if inserting && shaped.version.is_none() {
                return Err(StoreError::storage_msg(format!(
                    "NOT NULL constraint failed: {}.version",
                    crate::RECORDS_TABLE
                )));
            }
        }
    }
    Ok(shaped)
}

impl KeyLookup for MemoryRepository {
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>> {
        ctx.check()?;
        self.table.read().get(key)
    }
}

impl Repository for MemoryRepository {
    type Transaction = MemoryTransaction;

    fn schema(&self) -> Schema {
        self.schema
    }

    fn migrate(&self, ctx: &Context, mode: MigrationMode) -> Result<()> {
        let _lease = self.lease(ctx)?;
        let mut table = self.table.write();
        match mode {
            MigrationMode::CreateIfMissing => table.create_if_missing(),
            MigrationMode::Recreate => table.recreate(),
        }
        info!(?mode, schema = ?self.schema, "migrated in-memory records table");
        Ok(())
    }

    fn insert_row(&self, ctx: &Context, row: &Row) -> Result<u64> {
        let row = shape_row(self.schema, row, true)?;
        let _lease = self.lease(ctx)?;
        self.table.write().insert(row)
    }

    fn update_row_by_key(&self, ctx: &Context, row: &Row) -> Result<u64> {
        let row = shape_row(self.schema, row, false)?;
        let _lease = self.lease(ctx)?;
        self.table.write().update(&row)
    }

    fn delete_row_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<u64> {
        let _lease = self.lease(ctx)?;
        self.table.write().delete(key)
    }

    fn scan_all(&self, ctx: &Context) -> Result<Vec<Row>> {
        ctx.check()?;
        self.table.read().scan()
    }

    fn begin(&self, ctx: &Context, isolation: IsolationLevel) -> Result<MemoryTransaction> {
        ctx.check()?;
        let lease = match isolation {
            IsolationLevel::Serializable => Some(self.lease(ctx)?),
            IsolationLevel::ReadCommitted => None,
        };
        debug!(?isolation, "began in-memory transaction");
        Ok(MemoryTransaction {
            repo: self.clone(),
            lease,
            isolation,
            staged: FxHashMap::default(),
            finished: false,
        })
    }
}

/// Transaction over a [`MemoryRepository`]
///
/// Writes are staged and become visible at commit. Dropping an unfinished
/// transaction discards them and releases the lease.
#[derive(Debug)]
pub struct MemoryTransaction {
    repo: MemoryRepository,
    lease: Option<WriterLease>,
    isolation: IsolationLevel,
    staged: FxHashMap<RecordKey, Row>,
    finished: bool,
}

impl MemoryTransaction {
    fn require_active(&self) -> Result<()> {
        if self.finished {
            return Err(StoreError::storage_msg("transaction already finished"));
        }
        Ok(())
    }
}

impl KeyLookup for MemoryTransaction {
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>> {
        self.require_active()?;
        ctx.check()?;
        if let Some(row) = self.staged.get(key) {
            return Ok(Some(row.clone()));
        }
        self.repo.table.read().get(key)
    }
}

impl RepoTransaction for MemoryTransaction {
    fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    fn update_row_by_key(&mut self, ctx: &Context, row: &Row) -> Result<u64> {
        let row = shape_row(self.repo.schema, row, false)?;
        let Some(mut current) = self.find_by_key(ctx, &row.key)? else {
            return Ok(0);
        };
        current.title = row.title;
        current.content = row.content;
        if row.version.is_some() {
            current.version = row.version;
        }
        self.staged.insert(current.key.clone(), current);
        Ok(1)
    }

    fn commit(&mut self, ctx: &Context) -> Result<()> {
        self.require_active()?;
        ctx.check()?;

        // Read-committed transactions only contend for the lease now
        let lease = match self.lease.take() {
            Some(lease) => lease,
            None => self.repo.lease(ctx)?,
        };

        {
            let mut table = self.repo.table.write();
            for row in self.staged.values() {
                table.update(row)?;
            }
        }
        self.staged.clear();
        self.finished = true;
        drop(lease);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.staged.clear();
        self.lease = None;
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

//! SQLite-backed repository
//!
//! One database file, a small pool of connections, WAL journaling by
//! default. Serializable transactions open with `BEGIN IMMEDIATE` so
//! competing writers queue on the busy timeout instead of failing late.

mod pool;
mod sql;
mod transaction;

pub use transaction::SqliteTransaction;

use crate::repository::{IsolationLevel, KeyLookup, MigrationMode, Repository, Row, Schema};
use pool::{ConnectionPool, PooledConnection};
use recordstore_core::{Context, RecordKey, Result, StoreError};
use rusqlite::{Connection, ErrorCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default wait for a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of idle connections kept open
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 4;

/// Map a rusqlite error into a storage error tagged with `message`
pub(crate) fn sql_err(message: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |e| StoreError::storage(message, e)
}

/// Longest single lock wait before the context is looked at again
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn is_locked(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn set_busy_timeout(conn: &Connection, timeout: Duration) -> Result<()> {
    conn.busy_timeout(timeout).map_err(sql_err("set busy timeout"))
}

/// Run `op` with the busy timeout capped by the context deadline
///
/// A failure after the context stopped is reported as `Cancelled`.
pub(crate) fn bounded<T>(
    conn: &PooledConnection,
    ctx: &Context,
    op: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    ctx.check()?;
    let configured = conn.configured_busy_timeout();
    // Overshoot by a millisecond so a timed-out wait ends past the deadline
    let wait = ctx
        .remaining()
        .map_or(configured, |left| (left + Duration::from_millis(1)).min(configured));
    set_busy_timeout(conn, wait)?;

    let result = op(&**conn);
    let restored = set_busy_timeout(conn, configured);
    match result {
        Ok(value) => restored.map(|()| value),
        Err(e) => match ctx.cancel_reason() {
            Some(reason) => Err(StoreError::Cancelled { reason }),
            None => Err(e),
        },
    }
}

/// Run a lock-taking statement, retrying while the database is locked
///
/// Waits in short slices so cancellation from another thread is noticed
/// while queued behind a writer. Gives up with a storage error once the
/// configured busy timeout has elapsed.
pub(crate) fn wait_for_lock(
    conn: &PooledConnection,
    ctx: &Context,
    message: &'static str,
    statement: &str,
) -> Result<()> {
    let configured = conn.configured_busy_timeout();
    let started = Instant::now();
    let outcome = loop {
        if let Err(e) = ctx.check() {
            break Err(e);
        }
        let mut slice = configured
            .saturating_sub(started.elapsed())
            .min(LOCK_POLL_INTERVAL);
        if let Some(left) = ctx.remaining() {
            slice = slice.min(left);
        }
        if let Err(e) = set_busy_timeout(conn, slice) {
            break Err(e);
        }

        match conn.execute_batch(statement) {
            Err(e) if is_locked(&e) => {
                if let Some(reason) = ctx.cancel_reason() {
                    break Err(StoreError::Cancelled { reason });
                }
                if started.elapsed() >= configured {
                    break Err(StoreError::storage(message, e));
                }
            }
            result => break result.map_err(sql_err(message)),
        }
    };
    let restored = set_busy_timeout(conn, configured);
    outcome.and(restored)
}

/// SQLite journal mode applied to every connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Write-ahead log; readers do not block the writer
    #[default]
    Wal,
    /// Rollback journal
    Delete,
}

impl JournalMode {
    /// Value for `PRAGMA journal_mode`
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
        }
    }
}

/// Settings for [`SqliteRepository::open`]
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file; created if missing
    pub path: PathBuf,
    /// Table layout
    pub schema: Schema,
    /// How long a statement waits on a locked database
    pub busy_timeout: Duration,
    /// Journal mode
    pub journal_mode: JournalMode,
    /// Idle connections kept for reuse
    pub max_idle_connections: usize,
}

impl SqliteConfig {
    /// Defaults for the database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: Schema::default(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            journal_mode: JournalMode::default(),
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }

    /// Set the table layout
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the journal mode
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }
}

/// Repository over a SQLite database file
///
/// Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: ConnectionPool,
    schema: Schema,
}

impl SqliteRepository {
    /// Open (or create) the database file
    ///
    /// Opens one connection eagerly so a bad path fails here rather than on
    /// first use. Does not create the records table; call
    /// [`Repository::migrate`].
    pub fn open(config: SqliteConfig) -> Result<Self> {
        let pool = ConnectionPool::new(
            config.path.clone(),
            config.busy_timeout,
            config.journal_mode,
            config.max_idle_connections.max(1),
        );
        drop(pool.get()?);
        info!(
            path = %config.path.display(),
            schema = ?config.schema,
            journal_mode = config.journal_mode.as_pragma(),
            "opened SQLite repository"
        );
        Ok(Self {
            pool,
            schema: config.schema,
        })
    }
}

impl KeyLookup for SqliteRepository {
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::find(c, self.schema, key))
    }
}

impl Repository for SqliteRepository {
    type Transaction = SqliteTransaction;

    fn schema(&self) -> Schema {
        self.schema
    }

    fn migrate(&self, ctx: &Context, mode: MigrationMode) -> Result<()> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::migrate(c, self.schema, mode))?;
        info!(?mode, schema = ?self.schema, "migrated SQLite records table");
        Ok(())
    }

    fn insert_row(&self, ctx: &Context, row: &Row) -> Result<u64> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::insert(c, self.schema, row))
    }

    fn update_row_by_key(&self, ctx: &Context, row: &Row) -> Result<u64> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::update(c, self.schema, row))
    }

    fn delete_row_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<u64> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::delete(c, key))
    }

    fn scan_all(&self, ctx: &Context) -> Result<Vec<Row>> {
        ctx.check()?;
        let conn = self.pool.get()?;
        bounded(&conn, ctx, |c| sql::scan(c, self.schema, ctx))
    }

    fn begin(&self, ctx: &Context, isolation: IsolationLevel) -> Result<SqliteTransaction> {
        ctx.check()?;
        let conn = self.pool.get()?;
        let txn = SqliteTransaction::begin(ctx, conn, self.schema, isolation)?;
        debug!(?isolation, "began SQLite transaction");
        Ok(txn)
    }
}

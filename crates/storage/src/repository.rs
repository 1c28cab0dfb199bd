//! Repository traits
//!
//! A repository is raw key-addressed CRUD over one table of [`Row`]s. It
//! reports affected-row counts and leaves their interpretation to the store.
//!
//! ```text
//! Repository ──begin(isolation)──▶ RepoTransaction
//!     │                                │
//!     └──────── KeyLookup ◀────────────┘   (find_by_key on both)
//! ```

use recordstore_core::{Context, RecordKey, Result, VersionToken};
use serde::{Deserialize, Serialize};

/// One persisted row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Primary key
    pub key: RecordKey,
    /// Title column
    pub title: String,
    /// Content column
    pub content: String,
    /// Version column; always `None` under [`Schema::Baseline`]
    pub version: Option<VersionToken>,
}

/// Table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `key`, `title`, `content`: no version column
    Baseline,
    /// `key`, `title`, `content`, `version`
    #[default]
    Versioned,
}

impl Schema {
    /// True if rows carry a version column
    pub fn has_version(&self) -> bool {
        matches!(self, Schema::Versioned)
    }
}

/// Transaction isolation requested at `begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Reads see the latest committed state; writes land at commit.
    ///
    /// Insufficient for read-compare-write: two transactions can read the
    /// same version and both commit.
    ReadCommitted,
    /// Transactions behave as if run one at a time
    #[default]
    Serializable,
}

/// How `migrate` treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Create the table only if it does not exist (idempotent)
    #[default]
    CreateIfMissing,
    /// Drop and recreate the table, discarding every row
    Recreate,
}

/// Find a row by key
///
/// Implemented by repositories and by their open transactions so the same
/// lookup code runs inside and outside a transaction.
pub trait KeyLookup {
    /// Row stored under `key`, `None` if absent
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>>;
}

/// An open transaction
///
/// Dropping an unfinished transaction discards its writes. Callers that need
/// to observe rollback failures call [`RepoTransaction::rollback`] explicitly.
pub trait RepoTransaction: KeyLookup + Send {
    /// Isolation this transaction was opened with
    fn isolation(&self) -> IsolationLevel;

    /// Overwrite `title`/`content` (and `version` when `Some`) of the row at
    /// `row.key`. Returns the number of rows affected.
    fn update_row_by_key(&mut self, ctx: &Context, row: &Row) -> Result<u64>;

    /// Make the transaction's writes visible
    fn commit(&mut self, ctx: &Context) -> Result<()>;

    /// Discard the transaction's writes
    fn rollback(&mut self) -> Result<()>;

    /// True once committed or rolled back
    fn is_finished(&self) -> bool;
}

/// Key-addressed CRUD over the records table
pub trait Repository: KeyLookup + Send + Sync {
    /// Transaction type returned by [`Repository::begin`]
    type Transaction: RepoTransaction;

    /// Table layout this repository reads and writes
    fn schema(&self) -> Schema;

    /// Create (or recreate) the records table
    fn migrate(&self, ctx: &Context, mode: MigrationMode) -> Result<()>;

    /// Insert a new row. Returns the number of rows affected.
    fn insert_row(&self, ctx: &Context, row: &Row) -> Result<u64>;

    /// Overwrite `title`/`content` (and `version` when `Some`) of the row at
    /// `row.key`. Returns the number of rows affected.
    fn update_row_by_key(&self, ctx: &Context, row: &Row) -> Result<u64>;

    /// Delete the row at `key`. Returns the number of rows affected.
    fn delete_row_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<u64>;

    /// Every row, in storage order
    fn scan_all(&self, ctx: &Context) -> Result<Vec<Row>>;

    /// Open a transaction
    fn begin(&self, ctx: &Context, isolation: IsolationLevel) -> Result<Self::Transaction>;
}

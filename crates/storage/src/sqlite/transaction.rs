//! Transactions on a pooled SQLite connection

use super::pool::PooledConnection;
use super::{bounded, sql, sql_err, wait_for_lock};
use crate::repository::{IsolationLevel, KeyLookup, RepoTransaction, Row, Schema};
use recordstore_core::{Context, RecordKey, Result, StoreError};
use tracing::warn;

/// SQL that opens a transaction at the given isolation
///
/// `IMMEDIATE` takes the database write lock at begin, so two serializable
/// transactions never both read before one of them writes. `DEFERRED`
/// waits until the first write.
fn begin_sql(isolation: IsolationLevel) -> &'static str {
    match isolation {
        IsolationLevel::Serializable => "BEGIN IMMEDIATE",
        IsolationLevel::ReadCommitted => "BEGIN DEFERRED",
    }
}

/// Transaction over a [`super::SqliteRepository`]
///
/// Owns its connection for its whole life. Dropping an unfinished
/// transaction rolls it back.
#[derive(Debug)]
pub struct SqliteTransaction {
    conn: PooledConnection,
    schema: Schema,
    isolation: IsolationLevel,
    finished: bool,
}

impl SqliteTransaction {
    pub(crate) fn begin(
        ctx: &Context,
        conn: PooledConnection,
        schema: Schema,
        isolation: IsolationLevel,
    ) -> Result<Self> {
        wait_for_lock(&conn, ctx, "begin transaction", begin_sql(isolation))?;
        Ok(Self {
            conn,
            schema,
            isolation,
            finished: false,
        })
    }

    fn require_active(&self) -> Result<()> {
        if self.finished {
            return Err(StoreError::storage_msg("transaction already finished"));
        }
        Ok(())
    }
}

impl KeyLookup for SqliteTransaction {
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>> {
        self.require_active()?;
        bounded(&self.conn, ctx, |c| sql::find(c, self.schema, key))
    }
}

impl RepoTransaction for SqliteTransaction {
    fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    fn update_row_by_key(&mut self, ctx: &Context, row: &Row) -> Result<u64> {
        self.require_active()?;
        bounded(&self.conn, ctx, |c| sql::update(c, self.schema, row))
    }

    fn commit(&mut self, ctx: &Context) -> Result<()> {
        self.require_active()?;
        // A failed COMMIT leaves the transaction open for rollback
        wait_for_lock(&self.conn, ctx, "commit transaction", "COMMIT")?;
        self.finished = true;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.require_active()?;
        self.finished = true;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(sql_err("rollback transaction"))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "rollback of abandoned transaction failed");
        }
    }
}

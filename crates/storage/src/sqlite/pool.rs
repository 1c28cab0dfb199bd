//! Connection pool for the SQLite backend
//!
//! Connections are opened on demand and up to `max_idle` of them are kept
//! for reuse. A connection that comes back with a transaction still open is
//! closed instead of being pooled.

use super::{sql_err, JournalMode};
use parking_lot::Mutex;
use recordstore_core::Result;
use rusqlite::Connection;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug)]
struct PoolInner {
    path: PathBuf,
    busy_timeout: Duration,
    journal_mode: JournalMode,
    max_idle: usize,
    idle: Mutex<Vec<Connection>>,
}

/// Shared pool of connections to one database file
#[derive(Debug, Clone)]
pub(crate) struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub(crate) fn new(
        path: PathBuf,
        busy_timeout: Duration,
        journal_mode: JournalMode,
        max_idle: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                path,
                busy_timeout,
                journal_mode,
                max_idle,
                idle: Mutex::new(Vec::with_capacity(max_idle)),
            }),
        }
    }

    /// Check out a connection, opening a new one if none is idle
    pub(crate) fn get(&self) -> Result<PooledConnection> {
        let reused = self.inner.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.open_connection()?,
        };
        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        })
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    fn open_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.inner.path).map_err(sql_err("open database"))?;
        conn.busy_timeout(self.inner.busy_timeout)
            .map_err(sql_err("set busy timeout"))?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", self.inner.journal_mode.as_pragma(), |row| {
                row.get(0)
            })
            .map_err(sql_err("set journal mode"))?;
        if !mode.eq_ignore_ascii_case(self.inner.journal_mode.as_pragma()) {
            warn!(
                requested = self.inner.journal_mode.as_pragma(),
                actual = %mode,
                "SQLite did not accept journal mode"
            );
        }
        Ok(conn)
    }
}

/// Connection checked out of a [`ConnectionPool`]; returned on drop
#[derive(Debug)]
pub(crate) struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
}

impl PooledConnection {
    /// Busy timeout the pool configured on this connection
    pub(crate) fn configured_busy_timeout(&self) -> Duration {
        self.pool.busy_timeout
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out
        self.conn.as_ref().expect("pooled connection used after drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if !conn.is_autocommit() {
            // Left inside a transaction; closing it rolls that back
            warn!("discarding pooled connection with an open transaction");
            return;
        }
        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_idle {
            idle.push(conn);
        }
    }
}

//! Transaction guard
//!
//! Wraps an open [`RepoTransaction`] so that every exit path other than a
//! successful commit rolls it back. Rollback failures are logged and never
//! replace the error that caused the rollback.
//!
//! ## Lifecycle
//!
//! ```text
//! Active ──commit ok──▶ Committed
//!    │
//!    ├──commit err──▶ Aborted (rolled back, commit error returned)
//!    ├──abort──────▶ Aborted (rolled back)
//!    └──drop───────▶ Aborted (rolled back)
//! ```

use recordstore_core::{Context, RecordKey, Result};
use recordstore_storage::{KeyLookup, RepoTransaction, Row};
use tracing::{debug, error};

/// Where a guarded transaction is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Open; reads and writes allowed
    Active,
    /// Committed; writes are visible
    Committed,
    /// Rolled back (or rollback attempted)
    Aborted {
        /// Why the transaction was abandoned
        reason: String,
    },
}

/// Owns a transaction for one record's read-compare-write
pub struct TransactionGuard<T: RepoTransaction> {
    txn: T,
    key: RecordKey,
    status: TransactionStatus,
}

impl<T: RepoTransaction> TransactionGuard<T> {
    /// Guard `txn`; `key` labels log events
    pub fn new(txn: T, key: RecordKey) -> Self {
        Self {
            txn,
            key,
            status: TransactionStatus::Active,
        }
    }

    /// Current status
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    /// Key this transaction works on
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Update a row inside the transaction; returns affected rows
    pub fn update_row_by_key(&mut self, ctx: &Context, row: &Row) -> Result<u64> {
        self.txn.update_row_by_key(ctx, row)
    }

    /// Commit, or roll back and return the commit error
    pub fn commit(mut self, ctx: &Context) -> Result<()> {
        match self.txn.commit(ctx) {
            Ok(()) => {
                self.status = TransactionStatus::Committed;
                debug!(key = %self.key, "transaction committed");
                Ok(())
            }
            Err(e) => {
                self.rollback_logged(format!("commit failed: {}", e));
                Err(e)
            }
        }
    }

    /// Roll back and mark aborted
    pub fn abort(mut self, reason: impl Into<String>) {
        self.rollback_logged(reason.into());
    }

    fn rollback_logged(&mut self, reason: String) {
        if !self.txn.is_finished() {
            if let Err(e) = self.txn.rollback() {
                error!(
                    key = %self.key,
                    reason = %reason,
                    error = %e,
                    "transaction rollback failed"
                );
            }
        }
        self.status = TransactionStatus::Aborted { reason };
    }
}

impl<T: RepoTransaction> KeyLookup for TransactionGuard<T> {
    fn find_by_key(&self, ctx: &Context, key: &RecordKey) -> Result<Option<Row>> {
        self.txn.find_by_key(ctx, key)
    }
}

impl<T: RepoTransaction> Drop for TransactionGuard<T> {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            self.rollback_logged("dropped without commit".to_string());
        }
    }
}

impl<T: RepoTransaction> std::fmt::Debug for TransactionGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionGuard")
            .field("key", &self.key)
            .field("isolation", &self.txn.isolation())
            .field("status", &self.status)
            .finish()
    }
}

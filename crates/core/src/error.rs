//! Error types shared by every store layer
//!
//! Errors are structured: callers match on the kind and its fields rather
//! than on formatted text.

use crate::context::CancelReason;
use crate::types::{RecordKey, VersionToken};
use thiserror::Error;

/// Boxed underlying error kept as the source of a storage failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by repositories and stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// No persisted record under this key
    #[error("record not found: {key}")]
    NotFound {
        /// Key that was looked up
        key: RecordKey,
    },

    /// The caller's version does not match the stored version
    ///
    /// Terminal for the store: it never retries. The caller may re-read,
    /// merge and save again.
    #[error(
        "version mismatch on {key}: caller holds {}, stored is {}",
        display_token(.caller),
        display_token(.stored)
    )]
    Conflict {
        /// Record being saved
        key: RecordKey,
        /// Version the caller last observed
        caller: Option<VersionToken>,
        /// Version currently persisted
        stored: Option<VersionToken>,
    },

    /// A write touched a different number of rows than required
    #[error("expected {expected} row(s) affected by {operation}, got {actual}")]
    Consistency {
        /// Statement that was executed (insert, update, delete)
        operation: &'static str,
        /// Rows that had to be affected
        expected: u64,
        /// Rows actually affected
        actual: u64,
    },

    /// Lower-level I/O or transaction failure, propagated as-is
    #[error("storage error: {message}")]
    Storage {
        /// What the store was doing
        message: String,
        /// Underlying failure, if any
        #[source]
        source: Option<BoxError>,
    },

    /// The operation's context was cancelled or its deadline passed
    #[error("operation cancelled: {reason}")]
    Cancelled {
        /// Why the context stopped
        reason: CancelReason,
    },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Render an optional version token for messages, `<none>` when absent
pub fn display_token(token: &Option<VersionToken>) -> String {
    match token {
        Some(t) => t.to_string(),
        None => "<none>".to_string(),
    }
}

impl StoreError {
    /// Storage failure wrapping an underlying error
    pub fn storage<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Storage failure with no underlying error
    pub fn storage_msg(message: impl Into<String>) -> Self {
        StoreError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Check if this error is retryable.
    ///
    /// Only conflicts are: a fresh read followed by a new save may succeed.
    /// The store itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Check if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled { .. })
    }

    /// Check if this is a serious/unrecoverable error.
    ///
    /// Consistency failures mean storage state disagreed with what the
    /// store just observed.
    pub fn is_serious(&self) -> bool {
        matches!(self, StoreError::Consistency { .. })
    }
}

/// Require that exactly one row was affected by `operation`
///
/// # Examples
///
/// ```
/// use recordstore_core::error::ensure_single_row;
///
/// assert!(ensure_single_row("update", 1).is_ok());
/// assert!(ensure_single_row("update", 0).is_err());
/// ```
pub fn ensure_single_row(operation: &'static str, affected: u64) -> Result<()> {
    if affected != 1 {
        return Err(StoreError::Consistency {
            operation,
            expected: 1,
            actual: affected,
        });
    }
    Ok(())
}

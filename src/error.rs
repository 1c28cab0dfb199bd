//! Unified error types for recordstore.
//!
//! This module wraps the layer errors in one public type and adds the
//! configuration failures only the facade can produce.

use recordstore_core::error::{display_token, BoxError};
use recordstore_core::{CancelReason, RecordKey, StoreError, VersionToken};
use thiserror::Error;

/// All recordstore errors.
///
/// Variants mirror the store's error kinds one to one, so callers can match
/// on fields instead of message text.
#[derive(Debug, Error)]
pub enum Error {
    /// No record under this key
    #[error("record not found: {key}")]
    NotFound {
        /// Key that was looked up
        key: RecordKey,
    },

    /// Stale save: the caller's version is not the stored one
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

    /// A write affected an unexpected number of rows
    #[error("expected {expected} row(s) affected by {operation}, got {actual}")]
    Consistency {
        /// Statement that was executed
        operation: &'static str,
        /// Rows that had to be affected
        expected: u64,
        /// Rows actually affected
        actual: u64,
    },

    /// Storage error
    #[error("storage error: {message}")]
    Storage {
        /// What the store was doing
        message: String,
        /// Underlying failure, if any
        #[source]
        source: Option<BoxError>,
    },

    /// Context cancelled or deadline passed
    #[error("operation cancelled: {reason}")]
    Cancelled {
        /// Why the context stopped
        reason: CancelReason,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recordstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Conflicts may succeed after re-reading the record.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Consistency { .. })
    }
}

// Convert from store errors
impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { key } => Error::NotFound { key },
            StoreError::Conflict {
                key,
                caller,
                stored,
            } => Error::Conflict {
                key,
                caller,
                stored,
            },
            StoreError::Consistency {
                operation,
                expected,
                actual,
            } => Error::Consistency {
                operation,
                expected,
                actual,
            },
            StoreError::Storage { message, source } => Error::Storage { message, source },
            StoreError::Cancelled { reason } => Error::Cancelled { reason },
        }
    }
}

// Convert from config parse errors
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

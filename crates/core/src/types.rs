//! Core types for the record store
//!
//! This module defines the fundamental types used throughout the system:
//! - [`RecordKey`]: Unique identifier for a persisted record
//! - [`VersionToken`]: Opaque token identifying one persisted snapshot of a record
//! - [`Record`]: The entity callers read and write

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted record
///
/// Keys are opaque strings. Stores generate them as UUID v4 on first save,
/// but any non-empty string read back from storage is a valid key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Create a new random key using UUID v4
    ///
    /// # Examples
    ///
    /// ```
    /// use recordstore_core::RecordKey;
    ///
    /// let k1 = RecordKey::generate();
    /// let k2 = RecordKey::generate();
    /// assert_ne!(k1, k2);
    /// ```
    pub fn generate() -> Self {
        RecordKey(Uuid::new_v4().to_string())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        RecordKey(s.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        RecordKey(s)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque version token
///
/// A fresh token is stamped on every successful versioned write. Tokens are
/// compared for equality only; they carry no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Create a new, never-before-seen token
    ///
    /// # Examples
    ///
    /// ```
    /// use recordstore_core::VersionToken;
    ///
    /// assert_ne!(VersionToken::generate(), VersionToken::generate());
    /// ```
    pub fn generate() -> Self {
        VersionToken(Uuid::new_v4().to_string())
    }

    /// Token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        VersionToken(s.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        VersionToken(s)
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored record
///
/// A record starts life in memory with no key. The first save assigns the
/// key (and, for versioned stores, a version token); every later successful
/// versioned save replaces the token.
///
/// # Examples
///
/// ```
/// use recordstore_core::Record;
///
/// let record = Record::new("title", "content");
/// assert!(record.is_new());
/// assert!(record.version.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Key, `None` until the record is first persisted
    pub key: Option<RecordKey>,
    /// Free-form title
    pub title: String,
    /// Free-form content
    pub content: String,
    /// Version the caller last observed, `None` if never persisted
    pub version: Option<VersionToken>,
}

impl Record {
    /// Create an unsaved record
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: None,
            title: title.into(),
            content: content.into(),
            version: None,
        }
    }

    /// True if the record has never been persisted (no key, or an empty one)
    pub fn is_new(&self) -> bool {
        self.key.as_ref().map_or(true, |k| k.as_str().is_empty())
    }
}

//! Storage layer for recordstore
//!
//! This crate provides the repositories the stores are built on:
//! - [`Repository`] / [`RepoTransaction`]: key-addressed CRUD plus transactions
//! - [`MemoryRepository`]: in-process table with a single writer lease
//! - [`SqliteRepository`]: SQLite database file behind a small connection pool
//!
//! Repositories carry no concurrency semantics of their own beyond the
//! isolation level a transaction asks for.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod repository;
pub mod sqlite;

pub use memory::{MemoryRepository, MemoryTransaction};
pub use repository::{IsolationLevel, KeyLookup, MigrationMode, RepoTransaction, Repository, Row, Schema};
pub use sqlite::{JournalMode, SqliteConfig, SqliteRepository, SqliteTransaction};

/// Name of the records table in every backend
pub const RECORDS_TABLE: &str = "records";

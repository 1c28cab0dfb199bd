//! Store Comprehensive Test Suite
//!
//! End-to-end tests of the `Store` facade over both backends.
//!
//! ## Key Verification Points
//!
//! 1. Saves round-trip and assign keys and versions
//! 2. Stale optimistic saves fail with a structured conflict
//! 3. Concurrent optimistic saves never lose an update; last-write-wins does
//! 4. Cancelled contexts stop every operation and leave data untouched
//! 5. Configuration loads from TOML and is validated
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test store_comprehensive
//!
//! # Run conflict tests only
//! cargo test --test store_comprehensive conflicts::
//! ```

use recordstore::{Context, Record, Store};
use std::ops::Deref;
use tempfile::TempDir;

// Test modules
pub mod cancellation;
pub mod concurrency;
pub mod config;
pub mod crud;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Install a test-writer subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A store plus the directory that holds its file, removed on drop
pub struct TestStore {
    store: Store,
    _dir: Option<TempDir>,
}

impl Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

/// Optimistic in-memory store
pub fn memory_store() -> TestStore {
    init_tracing();
    TestStore {
        store: Store::ephemeral().expect("failed to create in-memory store"),
        _dir: None,
    }
}

/// Optimistic SQLite store in a fresh temp directory
pub fn sqlite_store() -> TestStore {
    init_tracing();
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = Store::open(dir.path().join("records.db")).expect("failed to open SQLite store");
    TestStore {
        store,
        _dir: Some(dir),
    }
}

/// Last-write-wins in-memory store over the baseline table
pub fn lww_memory_store() -> TestStore {
    init_tracing();
    let store = Store::builder()
        .ephemeral()
        .last_write_wins()
        .baseline_schema()
        .open()
        .expect("failed to create last-write-wins store");
    TestStore { store, _dir: None }
}

/// Last-write-wins SQLite store over the baseline table
pub fn lww_sqlite_store() -> TestStore {
    init_tracing();
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = Store::builder()
        .path(dir.path().join("records.db"))
        .last_write_wins()
        .baseline_schema()
        .open()
        .expect("failed to open last-write-wins store");
    TestStore {
        store,
        _dir: Some(dir),
    }
}

/// Run `f` against an optimistic store on every backend
pub fn test_across_backends<F>(name: &str, f: F)
where
    F: Fn(&Store),
{
    for (backend, store) in [("memory", memory_store()), ("sqlite", sqlite_store())] {
        eprintln!("{} [{}]", name, backend);
        f(&*store);
    }
}

/// Save a new record and return it with its assigned key and version
pub fn saved(store: &Store, title: &str, content: &str) -> Record {
    let mut record = Record::new(title, content);
    store
        .save(&Context::new(), &mut record)
        .expect("failed to save new record");
    record
}

//! Configuration Tests
//!
//! Stores opened from TOML files and builder settings.

use crate::*;
use recordstore::{
    Backend, ConcurrencyMode, Error, JournalMode, MigrationPolicy, Schema, StoreBuilder,
    StoreConfig,
};
use std::time::Duration;

#[test]
fn test_open_sqlite_store_from_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("records.db");
    let config_path = dir.path().join("store.toml");
    std::fs::write(
        &config_path,
        format!(
            "backend = \"sqlite\"\npath = {:?}\nmode = \"optimistic\"\njournal_mode = \"delete\"\nbusy_timeout_ms = 1000\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();

    let config = StoreConfig::from_file(&config_path).unwrap();
    assert_eq!(config.backend, Backend::Sqlite);
    assert_eq!(config.journal_mode, JournalMode::Delete);

    let store = StoreBuilder::from_config(config).open().unwrap();
    assert_eq!(store.backend(), Backend::Sqlite);
    assert_eq!(store.mode(), ConcurrencyMode::Optimistic);
    assert_eq!(store.path(), Some(db_path.as_path()));

    let record = saved(&store, "t", "c");
    assert!(record.version.is_some());
    assert!(db_path.exists());
}

#[test]
fn test_open_last_write_wins_from_str() {
    init_tracing();
    let config = StoreConfig::from_toml_str(
        r#"
        mode = "last_write_wins"
        schema = "baseline"
        lock_timeout_ms = 250
        "#,
    )
    .unwrap();
    assert_eq!(config.schema, Schema::Baseline);

    let store = StoreBuilder::from_config(config).open().unwrap();
    assert!(store.is_ephemeral());
    assert_eq!(store.mode(), ConcurrencyMode::LastWriteWins);
    assert!(saved(&store, "t", "c").version.is_none());
}

#[test]
fn test_invalid_combinations_are_config_errors() {
    let cases = [
        r#"schema = "baseline""#,
        r#"backend = "sqlite""#,
        "max_idle_connections = 0",
        "lock_timeout_ms = 0",
        r#"backend = "postgres""#,
        "busy_timeout_ms = \"soon\"",
    ];
    for case in cases {
        match StoreConfig::from_toml_str(case) {
            Err(Error::Config(_)) => {}
            other => panic!("{:?} should be rejected, got {:?}", case, other),
        }
    }
}

#[test]
fn test_builder_validates_like_config() {
    let err = Store::builder()
        .ephemeral()
        .optimistic()
        .baseline_schema()
        .open()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_builder_settings_reach_config() {
    let builder = Store::builder()
        .path("records.db")
        .last_write_wins()
        .baseline_schema()
        .busy_timeout(Duration::from_millis(1500))
        .lock_timeout(Duration::from_millis(300))
        .journal_mode(JournalMode::Delete)
        .migration(MigrationPolicy::None);

    let config = builder.config();
    assert_eq!(config.backend, Backend::Sqlite);
    assert_eq!(config.mode, ConcurrencyMode::LastWriteWins);
    assert_eq!(config.schema, Schema::Baseline);
    assert_eq!(config.busy_timeout_ms, 1500);
    assert_eq!(config.lock_timeout_ms, 300);
    assert_eq!(config.journal_mode, JournalMode::Delete);
    assert_eq!(config.migration, MigrationPolicy::None);

    let config = builder.ephemeral().config().clone();
    assert_eq!(config.backend, Backend::Memory);
    assert!(config.path.is_none());
}

#[test]
fn test_recreate_policy_wipes_existing_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    {
        let store = Store::open(&path).unwrap();
        saved(&store, "t", "c");
    }

    let store = Store::builder()
        .path(&path)
        .migration(MigrationPolicy::Recreate)
        .open()
        .unwrap();
    assert!(store.list(&Context::new()).unwrap().is_empty());
}

//! CRUD Tests
//!
//! Round-trip, update, delete and list through the facade.

use crate::*;
use proptest::prelude::*;
use recordstore::{ConcurrencyMode, Error, RecordKey};
use std::collections::{HashMap, HashSet};

#[test]
fn test_save_assigns_key_and_version() {
    test_across_backends("save_assigns_key_and_version", |store| {
        let ctx = Context::new();
        let mut record = Record::new("title", "content");
        store.save(&ctx, &mut record).unwrap();

        assert!(!record.is_new());
        assert!(record.version.is_some());

        let found = store.find(&ctx, record.key.as_ref().unwrap()).unwrap();
        assert_eq!(found.title, "title");
        assert_eq!(found.content, "content");
        assert_eq!(found, record);
    });
}

#[test]
fn test_each_insert_gets_fresh_identity() {
    test_across_backends("each_insert_gets_fresh_identity", |store| {
        let a = saved(store, "same", "same");
        let b = saved(store, "same", "same");
        assert_ne!(a.key, b.key);
        assert_ne!(a.version, b.version);
    });
}

#[test]
fn test_update_keeps_key_changes_version() {
    test_across_backends("update_keeps_key_changes_version", |store| {
        let ctx = Context::new();
        let mut record = saved(store, "title", "v1");
        let key = record.key.clone();
        let v1 = record.version.clone();

        record.title = "new title".to_string();
        record.content = "v2".to_string();
        store.save(&ctx, &mut record).unwrap();

        assert_eq!(record.key, key);
        assert_ne!(record.version, v1);

        let found = store.find(&ctx, key.as_ref().unwrap()).unwrap();
        assert_eq!(found.title, "new title");
        assert_eq!(found.content, "v2");
        assert_eq!(found.version, record.version);
    });
}

#[test]
fn test_find_missing_is_not_found() {
    test_across_backends("find_missing_is_not_found", |store| {
        let key = RecordKey::from("no-such-record");
        match store.find(&Context::new(), &key).unwrap_err() {
            Error::NotFound { key: missing } => assert_eq!(missing, key),
            other => panic!("expected not found, got {:?}", other),
        }
    });
}

#[test]
fn test_delete_is_idempotent() {
    test_across_backends("delete_is_idempotent", |store| {
        let ctx = Context::new();
        let record = saved(store, "t", "c");
        let key = record.key.unwrap();

        assert!(store.delete(&ctx, &key).unwrap());
        assert!(!store.delete(&ctx, &key).unwrap());
        assert!(store.find(&ctx, &key).unwrap_err().is_not_found());
    });
}

#[test]
fn test_list_is_complete() {
    test_across_backends("list_is_complete", |store| {
        let ctx = Context::new();
        let keys: HashSet<_> = (0..10)
            .map(|i| saved(store, &format!("t{}", i), "c").key.unwrap())
            .collect();

        let listed: HashSet<_> = store
            .list(&ctx)
            .unwrap()
            .into_iter()
            .map(|r| r.key.unwrap())
            .collect();
        assert_eq!(listed, keys);
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_list_returns_exactly_the_live_records(
        records in prop::collection::vec((".{0,20}", ".{0,40}", any::<bool>()), 0..20),
    ) {
        for store in [memory_store(), lww_memory_store()] {
            let ctx = Context::new();
            let mut expected = HashMap::new();
            for (title, content, keep) in &records {
                let record = saved(&store, title, content);
                let key = record.key.clone().unwrap();
                if *keep {
                    expected.insert(key, record);
                } else {
                    store.delete(&ctx, &key).unwrap();
                }
            }

            let listed: HashMap<_, _> = store
                .list(&ctx)
                .unwrap()
                .into_iter()
                .map(|r| (r.key.clone().unwrap(), r))
                .collect();
            prop_assert_eq!(listed, expected);
        }
    }
}

#[test]
fn test_list_empty_store() {
    test_across_backends("list_empty_store", |store| {
        assert!(store.list(&Context::new()).unwrap().is_empty());
    });
}

#[test]
fn test_migrate_is_destructive() {
    test_across_backends("migrate_is_destructive", |store| {
        let ctx = Context::new();
        saved(store, "t", "c");

        store.ensure_schema(&ctx).unwrap();
        assert_eq!(store.list(&ctx).unwrap().len(), 1);

        store.migrate(&ctx).unwrap();
        assert!(store.list(&ctx).unwrap().is_empty());
    });
}

#[test]
fn test_unicode_and_empty_fields_round_trip() {
    test_across_backends("unicode_and_empty_fields_round_trip", |store| {
        let ctx = Context::new();
        for (title, content) in [("", ""), ("日本語", "🌍 emoji"), ("quote ' \"", "line\nbreak")] {
            let record = saved(store, title, content);
            let found = store.find(&ctx, record.key.as_ref().unwrap()).unwrap();
            assert_eq!(found.title, title);
            assert_eq!(found.content, content);
        }
    });
}

#[test]
fn test_last_write_wins_round_trip() {
    for store in [lww_memory_store(), lww_sqlite_store()] {
        assert_eq!(store.mode(), ConcurrencyMode::LastWriteWins);
        let ctx = Context::new();
        let mut record = saved(&store, "t", "c");
        assert!(record.version.is_none());

        record.content = "d".to_string();
        store.save(&ctx, &mut record).unwrap();
        let found = store.find(&ctx, record.key.as_ref().unwrap()).unwrap();
        assert_eq!(found.content, "d");
        assert!(found.version.is_none());
    }
}

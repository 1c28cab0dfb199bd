//! Cancellation Tests
//!
//! A stopped context fails every operation with `Cancelled` and leaves
//! stored records as they were.

use crate::*;
use recordstore::{CancelReason, Error};
use std::thread;
use std::time::Duration;

fn assert_cancelled<T: std::fmt::Debug>(result: recordstore::Result<T>, expected: CancelReason) {
    match result {
        Err(Error::Cancelled { reason }) => assert_eq!(reason, expected),
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[test]
fn test_cancelled_context_fails_every_operation() {
    test_across_backends("cancelled_context_fails_every_operation", |store| {
        let mut existing = saved(store, "post", "0");
        let key = existing.key.clone().unwrap();

        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        assert_cancelled(store.find(&ctx, &key), CancelReason::Requested);
        assert_cancelled(
            store.save(&ctx, &mut Record::new("t", "c")),
            CancelReason::Requested,
        );
        existing.content = "1".to_string();
        assert_cancelled(store.save(&ctx, &mut existing), CancelReason::Requested);
        assert_cancelled(store.delete(&ctx, &key), CancelReason::Requested);
        assert_cancelled(store.list(&ctx), CancelReason::Requested);
        assert_cancelled(store.ensure_schema(&ctx), CancelReason::Requested);
        assert_cancelled(store.migrate(&ctx), CancelReason::Requested);
    });
}

#[test]
fn test_cancelled_save_leaves_record_untouched() {
    test_across_backends("cancelled_save_leaves_record_untouched", |store| {
        let mut record = saved(store, "post", "0");
        let before = record.clone();

        let (ctx, handle) = Context::with_cancel();
        handle.cancel();
        record.content = "1".to_string();
        assert!(store.save(&ctx, &mut record).unwrap_err().is_cancelled());

        // Nothing written back, nothing stored
        assert_eq!(record.version, before.version);
        let live = Context::new();
        assert_eq!(store.find(&live, before.key.as_ref().unwrap()).unwrap(), before);

        // Writers are not left blocked
        store.save(&live, &mut record).unwrap();
        assert_eq!(store.list(&live).unwrap().len(), 1);
    });
}

#[test]
fn test_expired_deadline() {
    test_across_backends("expired_deadline", |store| {
        let record = saved(store, "post", "0");
        let ctx = Context::with_timeout(Duration::ZERO);
        thread::sleep(Duration::from_millis(1));

        assert_cancelled(
            store.find(&ctx, record.key.as_ref().unwrap()),
            CancelReason::DeadlineExceeded,
        );
    });
}

#[test]
fn test_cancel_from_another_thread() {
    let store = memory_store();
    let record = saved(&store, "post", "0");
    let key = record.key.clone().unwrap();

    let (ctx, handle) = Context::with_cancel();
    assert!(store.find(&ctx, &key).is_ok());

    thread::spawn(move || handle.cancel()).join().unwrap();
    assert_cancelled(store.find(&ctx, &key), CancelReason::Requested);
}

#[test]
fn test_generous_deadline_does_not_interfere() {
    test_across_backends("generous_deadline_does_not_interfere", |store| {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        let mut record = Record::new("t", "0");
        store.save(&ctx, &mut record).unwrap();
        record.content = "1".to_string();
        store.save(&ctx, &mut record).unwrap();
        assert_eq!(store.find(&ctx, record.key.as_ref().unwrap()).unwrap().content, "1");
    });
}

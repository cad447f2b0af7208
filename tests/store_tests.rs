//! Tests for MemoryStorage
//!
//! These tests verify:
//! - Conditional transactions (invoke) and branch selection
//! - Revision clock monotonicity
//! - Range scans (ordering, bounds, tombstones, snapshot consistency)
//! - Watch delivery
//! - Snapshot/restore
//! - Lifecycle (start/stop) and concurrent access

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use metakv::store::WatchHandle;
use metakv::{
    Condition, Entry, KeyValueStorage, MemoryStorage, MetaKvError, Operation, RevisionOp,
    StoreSnapshot, Transaction,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_storage() -> MemoryStorage {
    let storage = MemoryStorage::new("test");
    storage.start().unwrap();
    storage
}

fn key(k: &'static [u8]) -> Bytes {
    Bytes::from_static(k)
}

fn put(k: &'static [u8], v: &'static [u8]) -> Operation {
    Operation::Put {
        key: key(k),
        value: Bytes::from_static(v),
    }
}

fn remove(k: &'static [u8]) -> Operation {
    Operation::Remove { key: key(k) }
}

fn put_if_absent(k: &'static [u8], v: &'static [u8]) -> Transaction {
    Transaction::on_success(Condition::NotExists(key(k)), vec![put(k, v)])
}

fn value_of(entry: Entry) -> Bytes {
    entry.value.expect("entry should not be a tombstone")
}

// =============================================================================
// Basic Transaction Tests
// =============================================================================

#[test]
fn test_get_never_written_key_is_absent() {
    let storage = setup_storage();
    assert!(storage.get(b"missing").unwrap().is_none());
}

#[test]
fn test_not_exists_condition_on_fresh_key() {
    let storage = setup_storage();

    let accepted = storage.invoke(&put_if_absent(b"A", b"v1")).unwrap();

    assert!(accepted);
    let entry = storage.get(b"A").unwrap().unwrap();
    assert_eq!(value_of(entry), Bytes::from_static(b"v1"));
}

#[test]
fn test_put_if_absent_is_idempotent_rejection() {
    let storage = setup_storage();
    let txn = put_if_absent(b"A", b"v1");

    assert!(storage.invoke(&txn).unwrap());
    let first = storage.get(b"A").unwrap().unwrap();

    // Re-invoking always returns false and never mutates state
    assert!(!storage.invoke(&txn).unwrap());
    assert!(!storage.invoke(&txn).unwrap());

    let after = storage.get(b"A").unwrap().unwrap();
    assert_eq!(after, first);
}

#[test]
fn test_rev_less_or_equal_zero_on_fresh_key() {
    let storage = setup_storage();

    let txn = Transaction::on_success(
        Condition::Revision {
            key: key(b"A"),
            op: RevisionOp::LessOrEqual,
            threshold: 0,
        },
        vec![put(b"A", b"v1")],
    );

    // An absent key has revision 0
    assert!(storage.invoke(&txn).unwrap());
    assert!(storage.get(b"A").unwrap().is_some());
}

#[test]
fn test_exactly_one_branch_applies() {
    let storage = setup_storage();

    let txn = Transaction::new(
        Condition::NotExists(key(b"guard")),
        vec![put(b"taken", b"success")],
        vec![put(b"taken", b"failure"), put(b"other", b"failure")],
    );

    assert!(storage.invoke(&txn).unwrap());
    assert_eq!(
        value_of(storage.get(b"taken").unwrap().unwrap()),
        Bytes::from_static(b"success")
    );
    assert!(storage.get(b"other").unwrap().is_none());
}

#[test]
fn test_failure_branch_applies_when_condition_false() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"guard", b"x")).unwrap();

    let txn = Transaction::new(
        Condition::NotExists(key(b"guard")),
        vec![put(b"out", b"success")],
        vec![put(b"out", b"failure")],
    );

    assert!(!storage.invoke(&txn).unwrap());
    assert_eq!(
        value_of(storage.get(b"out").unwrap().unwrap()),
        Bytes::from_static(b"failure")
    );
}

#[test]
fn test_guard_one_key_mutate_another() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"lock", b"held")).unwrap();

    let txn = Transaction::on_success(
        Condition::Exists(key(b"lock")),
        vec![put(b"data1", b"a"), put(b"data2", b"b")],
    );

    assert!(storage.invoke(&txn).unwrap());
    assert!(storage.get(b"data1").unwrap().is_some());
    assert!(storage.get(b"data2").unwrap().is_some());
}

#[test]
fn test_last_write_wins_within_branch() {
    let storage = setup_storage();

    let txn = Transaction::on_success(
        Condition::NotExists(key(b"A")),
        vec![put(b"A", b"first"), put(b"A", b"second"), put(b"A", b"third")],
    );

    assert!(storage.invoke(&txn).unwrap());
    assert_eq!(
        value_of(storage.get(b"A").unwrap().unwrap()),
        Bytes::from_static(b"third")
    );
}

#[test]
fn test_put_then_remove_within_branch() {
    let storage = setup_storage();

    let txn = Transaction::on_success(
        Condition::NotExists(key(b"A")),
        vec![put(b"A", b"v"), remove(b"A")],
    );

    assert!(storage.invoke(&txn).unwrap());
    let entry = storage.get(b"A").unwrap().unwrap();
    assert!(entry.is_tombstone());
}

// =============================================================================
// Revision Clock Tests
// =============================================================================

#[test]
fn test_revisions_strictly_increase() {
    let storage = setup_storage();
    assert_eq!(storage.revision().unwrap(), 0);

    storage.invoke(&put_if_absent(b"a", b"1")).unwrap();
    let r1 = storage.revision().unwrap();
    storage.invoke(&put_if_absent(b"b", b"2")).unwrap();
    let r2 = storage.revision().unwrap();

    assert!(r1 > 0);
    assert!(r2 > r1);

    let ea = storage.get(b"a").unwrap().unwrap();
    let eb = storage.get(b"b").unwrap().unwrap();
    assert_eq!(ea.revision, r1);
    assert_eq!(eb.revision, r2);
}

#[test]
fn test_dry_probe_advances_clock() {
    let storage = setup_storage();

    // Both branches empty: a pure probe of the condition
    let probe = Transaction::new(Condition::NotExists(key(b"A")), vec![], vec![]);

    let before = storage.revision().unwrap();
    assert!(storage.invoke(&probe).unwrap());
    let after = storage.revision().unwrap();

    assert_eq!(after, before + 1);
    assert!(storage.get(b"A").unwrap().is_none());
}

#[test]
fn test_all_ops_in_branch_share_one_revision() {
    let storage = setup_storage();

    let txn = Transaction::on_success(
        Condition::NotExists(key(b"a")),
        vec![put(b"a", b"1"), put(b"b", b"2"), remove(b"c")],
    );
    storage.invoke(&txn).unwrap();

    let revision = storage.revision().unwrap();
    for k in [b"a" as &[u8], b"b", b"c"] {
        assert_eq!(storage.get(k).unwrap().unwrap().revision, revision);
    }
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_remove_leaves_tombstone() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"A", b"v1")).unwrap();

    let txn = Transaction::on_success(Condition::Exists(key(b"A")), vec![remove(b"A")]);
    assert!(storage.invoke(&txn).unwrap());

    let entry = storage.get(b"A").unwrap().unwrap();
    assert!(entry.is_tombstone());
    assert_eq!(entry.revision, storage.revision().unwrap());

    // Conditions against the deleted key stay well-defined
    assert!(!storage
        .invoke(&Transaction::new(Condition::Exists(key(b"A")), vec![], vec![]))
        .unwrap());
    assert!(storage
        .invoke(&Transaction::new(Condition::NotExists(key(b"A")), vec![], vec![]))
        .unwrap());
}

#[test]
fn test_rewrite_after_tombstone() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"A", b"v1")).unwrap();
    storage
        .invoke(&Transaction::on_success(
            Condition::Exists(key(b"A")),
            vec![remove(b"A")],
        ))
        .unwrap();

    // NotExists holds again, so put-if-absent succeeds a second time
    assert!(storage.invoke(&put_if_absent(b"A", b"v2")).unwrap());
    assert_eq!(
        value_of(storage.get(b"A").unwrap().unwrap()),
        Bytes::from_static(b"v2")
    );
}

// =============================================================================
// Range Scan Tests
// =============================================================================

fn populate(storage: &MemoryStorage, keys: &[&'static [u8]]) {
    for k in keys {
        let txn = Transaction::on_success(
            Condition::NotExists(Bytes::copy_from_slice(k)),
            vec![Operation::Put {
                key: Bytes::copy_from_slice(k),
                value: Bytes::from_static(b"v"),
            }],
        );
        assert!(storage.invoke(&txn).unwrap());
    }
}

#[test]
fn test_range_ordered_and_half_open() {
    let storage = setup_storage();
    populate(&storage, &[b"d", b"b", b"a", b"c", b"e"]);

    let keys: Vec<Bytes> = storage
        .range(b"b", Some(b"e"), false)
        .unwrap()
        .map(|e| e.key)
        .collect();

    assert_eq!(keys, vec![key(b"b"), key(b"c"), key(b"d")]);
}

#[test]
fn test_range_unbounded_upper() {
    let storage = setup_storage();
    populate(&storage, &[b"a", b"b", b"c"]);

    let count = storage.range(b"b", None, false).unwrap().count();
    assert_eq!(count, 2);
}

#[test]
fn test_range_excludes_tombstones_by_default() {
    let storage = setup_storage();
    populate(&storage, &[b"a", b"b", b"c"]);
    storage
        .invoke(&Transaction::on_success(
            Condition::Exists(key(b"b")),
            vec![remove(b"b")],
        ))
        .unwrap();

    let keys: Vec<Bytes> = storage
        .range(b"a", None, false)
        .unwrap()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec![key(b"a"), key(b"c")]);

    let with_tombstones = storage.range(b"a", None, true).unwrap().count();
    assert_eq!(with_tombstones, 3);
}

#[test]
fn test_range_invalid_bounds_rejected() {
    let storage = setup_storage();
    populate(&storage, &[b"a"]);
    let before = storage.revision().unwrap();

    let result = storage.range(b"b", Some(b"a"), false);
    assert!(matches!(result, Err(MetaKvError::InvalidRange)));

    let result = storage.range(b"a", Some(b"a"), false);
    assert!(matches!(result, Err(MetaKvError::InvalidRange)));

    // No state mutated
    assert_eq!(storage.revision().unwrap(), before);
}

#[test]
fn test_range_is_point_in_time_snapshot() {
    let storage = setup_storage();
    populate(&storage, &[b"a", b"b"]);

    let scan = storage.range(b"a", None, false).unwrap();

    // Mutations after the scan was taken must not show up in it
    populate(&storage, &[b"c"]);
    storage
        .invoke(&Transaction::on_success(
            Condition::Exists(key(b"a")),
            vec![remove(b"a")],
        ))
        .unwrap();

    let keys: Vec<Bytes> = scan.map(|e| e.key).collect();
    assert_eq!(keys, vec![key(b"a"), key(b"b")]);
}

#[test]
fn test_range_remaining() {
    let storage = setup_storage();
    populate(&storage, &[b"a", b"b", b"c"]);

    let mut scan = storage.range(b"a", None, false).unwrap();
    assert_eq!(scan.remaining(), 3);
    scan.next();
    assert_eq!(scan.remaining(), 2);
}

// =============================================================================
// Watch Tests
// =============================================================================

fn drain(handle: &WatchHandle) -> Vec<metakv::store::EntryEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_watch_receives_batch_per_transaction() {
    let storage = setup_storage();
    let handle = storage.watch(b"", None).unwrap();

    storage
        .invoke(&Transaction::on_success(
            Condition::NotExists(key(b"a")),
            vec![put(b"a", b"1"), put(b"b", b"2")],
        ))
        .unwrap();
    storage.invoke(&put_if_absent(b"c", b"3")).unwrap();

    let events = drain(&handle);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].entries.len(), 2); // one atomic batch, never split
    assert_eq!(events[1].entries.len(), 1);
    assert!(events[0].revision < events[1].revision);
}

#[test]
fn test_watch_filters_by_range() {
    let storage = setup_storage();
    let handle = storage.watch(b"m", Some(b"p")).unwrap();

    storage.invoke(&put_if_absent(b"a", b"out")).unwrap();
    storage.invoke(&put_if_absent(b"n", b"in")).unwrap();
    storage.invoke(&put_if_absent(b"p", b"out")).unwrap();

    let events = drain(&handle);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entries[0].key, key(b"n"));
}

#[test]
fn test_watch_sees_removes_as_tombstones() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"a", b"1")).unwrap();

    let handle = storage.watch(b"", None).unwrap();
    storage
        .invoke(&Transaction::on_success(
            Condition::Exists(key(b"a")),
            vec![remove(b"a")],
        ))
        .unwrap();

    let events = drain(&handle);
    assert_eq!(events.len(), 1);
    assert!(events[0].entries[0].is_tombstone());
}

#[test]
fn test_watch_dry_probe_emits_nothing() {
    let storage = setup_storage();
    let handle = storage.watch(b"", None).unwrap();

    storage
        .invoke(&Transaction::new(Condition::NotExists(key(b"a")), vec![], vec![]))
        .unwrap();

    assert!(handle.try_recv().is_none());
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_restore_round_trip() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"a", b"1")).unwrap();
    storage.invoke(&put_if_absent(b"b", b"2")).unwrap();
    storage
        .invoke(&Transaction::on_success(
            Condition::Exists(key(b"b")),
            vec![remove(b"b")],
        ))
        .unwrap();

    let snapshot = storage.snapshot().unwrap();
    let encoded = snapshot.encode().unwrap();
    let decoded = StoreSnapshot::decode(&encoded).unwrap();

    let restored = MemoryStorage::new("restored");
    restored.restore(decoded).unwrap();
    restored.start().unwrap();

    // Values, tombstones, and the clock all carry over
    assert_eq!(
        value_of(restored.get(b"a").unwrap().unwrap()),
        Bytes::from_static(b"1")
    );
    assert!(restored.get(b"b").unwrap().unwrap().is_tombstone());
    assert_eq!(restored.revision().unwrap(), storage.revision().unwrap());

    // New transactions resume above the restored revision
    let before = restored.revision().unwrap();
    restored.invoke(&put_if_absent(b"c", b"3")).unwrap();
    assert_eq!(restored.revision().unwrap(), before + 1);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_operations_before_start_fail() {
    let storage = MemoryStorage::new("test");
    assert!(matches!(storage.get(b"a"), Err(MetaKvError::Stopped)));
    assert!(matches!(
        storage.invoke(&put_if_absent(b"a", b"1")),
        Err(MetaKvError::Stopped)
    ));
}

#[test]
fn test_operations_after_stop_fail_fast() {
    let storage = setup_storage();
    storage.invoke(&put_if_absent(b"a", b"1")).unwrap();
    storage.stop().unwrap();

    assert!(matches!(storage.get(b"a"), Err(MetaKvError::Stopped)));
    assert!(matches!(
        storage.invoke(&put_if_absent(b"b", b"2")),
        Err(MetaKvError::Stopped)
    ));
    assert!(matches!(
        storage.range(b"a", None, false),
        Err(MetaKvError::Stopped)
    ));
    assert!(matches!(storage.revision(), Err(MetaKvError::Stopped)));
    assert!(matches!(storage.watch(b"a", None), Err(MetaKvError::Stopped)));
}

#[test]
fn test_stop_is_idempotent_but_restart_is_not_allowed() {
    let storage = setup_storage();
    storage.stop().unwrap();
    storage.stop().unwrap();

    assert!(matches!(storage.start(), Err(MetaKvError::Stopped)));
}

#[test]
fn test_start_is_idempotent() {
    let storage = setup_storage();
    storage.start().unwrap();
    assert!(storage.invoke(&put_if_absent(b"a", b"1")).unwrap());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_put_if_absent_single_winner() {
    let storage = Arc::new(setup_storage());

    let mut handles = vec![];
    for t in 0..8 {
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            let txn = Transaction::on_success(
                Condition::NotExists(Bytes::from_static(b"leader")),
                vec![Operation::Put {
                    key: Bytes::from_static(b"leader"),
                    value: Bytes::from(format!("thread{}", t)),
                }],
            );
            storage.invoke(&txn).unwrap()
        }));
    }

    let winners: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();

    // Exactly one compare-and-apply can win the race
    assert_eq!(winners, 1);
}

#[test]
fn test_concurrent_invokes_get_distinct_revisions() {
    let storage = Arc::new(setup_storage());

    let mut handles = vec![];
    for t in 0..4 {
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let k = Bytes::from(format!("t{}_k{}", t, i));
                let txn = Transaction::on_success(
                    Condition::NotExists(k.clone()),
                    vec![Operation::Put {
                        key: k,
                        value: Bytes::from_static(b"v"),
                    }],
                );
                assert!(storage.invoke(&txn).unwrap());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 200 committed transactions, 200 distinct revisions
    assert_eq!(storage.revision().unwrap(), 200);

    let mut revisions: Vec<u64> = storage
        .range(b"", None, false)
        .unwrap()
        .map(|e| e.revision)
        .collect();
    revisions.sort_unstable();
    revisions.dedup();
    assert_eq!(revisions.len(), 200);
}

// ABOUTME: Tests for the deliverable store write semantics.
// ABOUTME: Covers registration, terminal immutability, unit checks, and concurrent writers.

use std::sync::Arc;

use super::store::DeliverableStore;
use crate::deliverable::{
    DeliverableSpec, FailureReason, RecordState, Status, UndeterminedCause,
};
use crate::error::StoreError;
use crate::unit::{Quantity, Unit};

#[test]
fn test_register_creates_unresolved_record() {
    let store = DeliverableStore::new();
    let record = store.register("a").unwrap();
    assert_eq!(record.state, RecordState::Unresolved);
    assert_eq!(store.get("a").unwrap().status(), Status::Unresolved);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_register_duplicate_key_fails() {
    let store = DeliverableStore::new();
    store.register("a").unwrap();

    match store.register("a") {
        Err(StoreError::DuplicateKey(key)) => assert_eq!(key, "a"),
        other => panic!("Expected DuplicateKey, got {:?}", other),
    }
}

#[test]
fn test_get_unknown_key() {
    let store = DeliverableStore::new();
    assert_eq!(
        store.get("missing"),
        Err(StoreError::UnknownKey("missing".into()))
    );
}

#[test]
fn test_resolved_record_is_immutable() {
    let store = DeliverableStore::new();
    store.register("a").unwrap();
    store.set_resolved("a", Quantity::millions(108.03)).unwrap();

    let again = store.set_resolved("a", Quantity::millions(1.0));
    assert!(matches!(again, Err(StoreError::AlreadyTerminal { .. })));

    let failed = store.set_failed(
        "a",
        FailureReason::Aborted {
            message: "late".into(),
        },
    );
    assert!(matches!(failed, Err(StoreError::AlreadyTerminal { .. })));

    assert_eq!(
        store.get("a").unwrap().value(),
        Some(&Quantity::millions(108.03))
    );
}

#[test]
fn test_failed_record_is_immutable() {
    let store = DeliverableStore::new();
    store.register("a").unwrap();
    store
        .set_failed(
            "a",
            FailureReason::Aborted {
                message: "no data".into(),
            },
        )
        .unwrap();

    let result = store.set_resolved("a", Quantity::millions(1.0));
    match result {
        Err(StoreError::AlreadyTerminal { key, state }) => {
            assert_eq!(key, "a");
            assert_eq!(state, "failed");
        }
        other => panic!("Expected AlreadyTerminal, got {:?}", other),
    }
}

#[test]
fn test_undetermined_is_terminal() {
    let store = DeliverableStore::new();
    store.register("a").unwrap();
    store.start("a").unwrap();
    store
        .set_undetermined("a", UndeterminedCause::StepBudgetExhausted { steps: 3 })
        .unwrap();

    assert!(store.set_resolved("a", Quantity::scalar(1.0)).is_err());
    let record = store.get("a").unwrap();
    assert!(record.was_attempted());
    assert_eq!(record.status(), Status::Unresolved);
}

#[test]
fn test_start_twice_is_rejected() {
    let store = DeliverableStore::new();
    store.register("a").unwrap();
    store.start("a").unwrap();
    assert_eq!(
        store.start("a"),
        Err(StoreError::AlreadyRunning("a".into()))
    );
}

#[test]
fn test_expected_unit_rejects_other_scale() {
    let store = DeliverableStore::new();
    let spec = DeliverableSpec::new("market", "market size").with_expected_unit(Unit::Millions);
    store.register_spec(&spec).unwrap();
    store.start("market").unwrap();

    let err = store
        .set_resolved("market", Quantity::new(1_200_000_000.0, Unit::Absolute))
        .unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(err, StoreError::UnitMismatch { .. }));

    // Record untouched, so the owner can still record the failure.
    assert_eq!(store.get("market").unwrap().state, RecordState::Running);
    store
        .set_failed(
            "market",
            FailureReason::UnitMismatch {
                expected: Unit::Millions,
                actual: Unit::Absolute,
            },
        )
        .unwrap();
    assert_eq!(store.get("market").unwrap().status(), Status::Failed);
}

#[test]
fn test_expire_subtree_only_touches_open_records_of_root() {
    let store = DeliverableStore::new();
    let a = DeliverableSpec::new("a", "a");
    let a1 = a.child("a.1", crate::deliverable::SpecOverrides::new("a1"));
    let a2 = a.child("a.2", crate::deliverable::SpecOverrides::new("a2"));
    let b = DeliverableSpec::new("b", "b");
    for spec in [&a, &a1, &a2, &b] {
        store.register_spec(spec).unwrap();
    }
    store.set_resolved("a.1", Quantity::scalar(1.0)).unwrap();
    store.start("a").unwrap();

    let expired = store.expire_subtree("a", UndeterminedCause::Timeout { after_ms: 10 });
    assert_eq!(expired, vec!["a".to_string(), "a.2".to_string()]);
    assert_eq!(store.get("a.1").unwrap().status(), Status::Resolved);
    assert_eq!(store.get("b").unwrap().state, RecordState::Unresolved);
}

#[test]
fn test_clone_shares_state() {
    let store = DeliverableStore::new();
    let clone = store.clone();
    store.register("a").unwrap();
    assert!(clone.contains("a"));
}

#[tokio::test]
async fn test_concurrent_terminal_writes_exactly_one_wins() {
    let store = Arc::new(DeliverableStore::new());
    store.register("shared").unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.set_resolved("shared", Quantity::scalar(i as f64))
        }));
    }

    let mut wins = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => wins += 1,
            Err(StoreError::AlreadyTerminal { .. }) => rejections += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(wins, 1, "exactly one terminal write should succeed");
    assert_eq!(rejections, 9);
}

#[tokio::test]
async fn test_concurrent_writes_to_distinct_keys() {
    let store = DeliverableStore::new();
    for i in 0..5 {
        store.register(&format!("k{}", i)).unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..5 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.set_resolved(&format!("k{}", i), Quantity::millions(i as f64))
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.iter().all(|r| r.status() == Status::Resolved));
}

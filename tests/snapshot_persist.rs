//! Explicit snapshot persistence.
//!
//! These tests verify that:
//! - A saved snapshot restores every resource in per-kind order
//! - Retired ids stay retired after a restore
//! - A corrupt snapshot file is reported, not swallowed

mod common;

use std::fs;

use common::{dispatcher, ids, params, register_all, run};
use computesim::{
    Dispatcher, InMemoryResourceStore, RequestParams, ResourceKind, ResourceStore, SharedStore,
    StorageError, StoreSnapshot,
};
use tempfile::tempdir;

#[test]
fn test_save_and_restore_preserves_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    let d = dispatcher();
    let created = run(&d, 7, "t3.micro");
    d.dispatch("TerminateInstances", &params(&[("InstanceId.1", created[2].as_str())]))
        .unwrap();
    d.store().with(|s| s.snapshot()).save_to(&path).unwrap();

    let snapshot = StoreSnapshot::load_from(&path).unwrap();
    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot.retired.len(), 1);

    let restored = InMemoryResourceStore::from_snapshot(snapshot).unwrap();
    assert!(restored.is_retired(&created[2]));
    let mut d2 = Dispatcher::new(SharedStore::new(restored));
    register_all(&mut d2);

    let response = d2.dispatch("DescribeInstances", &RequestParams::new()).unwrap();
    let mut expected = created.clone();
    expected.remove(2);
    assert_eq!(ids(&response.body, "instancesSet", "instanceId"), expected);
}

#[test]
fn test_retired_ids_survive_restore() {
    let d = dispatcher();
    let created = run(&d, 1, "t3.micro");
    let snapshot_with_instance = d.store().with(|s| s.snapshot());
    d.dispatch("TerminateInstances", &params(&[("InstanceId.1", created[0].as_str())]))
        .unwrap();

    let snapshot = d.store().with(|s| s.snapshot());
    let mut restored = InMemoryResourceStore::from_snapshot(snapshot).unwrap();
    let old = snapshot_with_instance.resources[0].clone();
    let err = restored.put(old).unwrap_err();
    assert!(matches!(err, StorageError::RetiredId(_)));
    assert!(restored.get_typed(&ResourceKind::Instance).is_empty());
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{\"account_id\": ").unwrap();
    assert!(matches!(
        StoreSnapshot::load_from(&path).unwrap_err(),
        StorageError::Serialization(_)
    ));
    assert!(matches!(
        StoreSnapshot::load_from(dir.path().join("missing.json")).unwrap_err(),
        StorageError::Io(_)
    ));
}

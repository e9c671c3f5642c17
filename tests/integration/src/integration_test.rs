//! End-to-end scenarios across the store, the reconciler and the manager
//!
//! Each test runs whole delivery passes the way an operator loop would:
//! list the records, reconcile every key, repeat.

use std::sync::Arc;
use std::thread;

use dredger_api::{ConditionStatus, ConditionType, Node, find_condition};
use dredger_core::{
    ConfigurationStore, FileStore, MemoryStore, NodeClient, NodeLabelManager, ReconcileOutcome,
    Reconciler, content_hash_label,
};
use dredger_fs::checksum::content_hash;
use dredger_test_utils::{TestRoot, configuration, spec};
use pretty_assertions::assert_eq;

/// Reconcile every stored record once.
fn deliver_all(store: &dyn ConfigurationStore, reconciler: &Reconciler) -> Vec<ReconcileOutcome> {
    store
        .list()
        .unwrap()
        .iter()
        .map(|conf| reconciler.reconcile(&conf.key()).unwrap())
        .collect()
}

#[test]
fn test_many_records_converge_in_one_pass() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));

    for i in 0..10 {
        store
            .create(configuration(
                &format!("app-{i}"),
                spec(&format!("app-{i}.conf"), &format!("id={i}\n"), true, None),
            ))
            .unwrap();
    }

    let outcomes = deliver_all(store.as_ref(), &reconciler);
    assert!(
        outcomes
            .iter()
            .all(|o| *o == ReconcileOutcome::Synced { status_updated: true })
    );
    for i in 0..10 {
        assert_eq!(root.read_target(&format!("app-{i}.conf")), format!("id={i}\n"));
    }

    // A second pass has nothing to report
    let outcomes = deliver_all(store.as_ref(), &reconciler);
    assert!(
        outcomes
            .iter()
            .all(|o| *o == ReconcileOutcome::Synced { status_updated: false })
    );
    root.assert_no_temp_files();
}

#[test]
fn test_parallel_passes_share_one_manager() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = Arc::new(Reconciler::new(store.clone(), Arc::new(root.manager())));

    let keys: Vec<_> = (0..8)
        .map(|i| {
            store
                .create(configuration(
                    &format!("app-{i}"),
                    spec(&format!("app-{i}.conf"), &"x".repeat(4096 + i), true, None),
                ))
                .unwrap()
                .key()
        })
        .collect();

    let handles: Vec<_> = keys
        .iter()
        .cloned()
        .map(|key| {
            let reconciler = Arc::clone(&reconciler);
            thread::spawn(move || reconciler.reconcile(&key).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (i, key) in keys.iter().enumerate() {
        let conf = store.get(key).unwrap();
        let available = find_condition(&conf.status.conditions, ConditionType::Available).unwrap();
        assert_eq!(available.status, ConditionStatus::True);
        assert_eq!(root.read_target(&format!("app-{i}.conf")).len(), 4096 + i);
    }
    root.assert_no_temp_files();
}

#[test]
fn test_two_records_one_file_last_writer_wins() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));

    let first = store
        .create(configuration("first", spec("shared.conf", "one", true, None)))
        .unwrap();
    let second = store
        .create(configuration("second", spec("shared.conf", "two", true, None)))
        .unwrap();

    reconciler.reconcile(&first.key()).unwrap();
    reconciler.reconcile(&second.key()).unwrap();
    assert_eq!(root.read_target("shared.conf"), "two");
}

#[test]
fn test_label_mirror_tracks_content_changes() {
    let root = TestRoot::new();
    let store = Arc::new(FileStore::open(root.records_dir()).unwrap());
    root.write("records/nodes/worker-0.yaml", "name: worker-0\n");
    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()))
        .with_node_labels(NodeLabelManager::new("worker-0", store.clone()));
    let label = content_hash_label("app.conf");

    let created = store
        .create(configuration("app", spec("app.conf", "v1", true, None)))
        .unwrap();
    reconciler.reconcile(&created.key()).unwrap();
    assert_eq!(store.get_node("worker-0").unwrap().labels[&label], content_hash(b"v1"));

    let mut conf = store.get(&created.key()).unwrap();
    conf.spec.content = "v2".into();
    store.update(&conf).unwrap();
    reconciler.reconcile(&created.key()).unwrap();
    assert_eq!(store.get_node("worker-0").unwrap().labels[&label], content_hash(b"v2"));

    store.delete(&created.key()).unwrap();
    reconciler.reconcile(&created.key()).unwrap();
    assert!(store.get_node("worker-0").unwrap().labels.is_empty());
}

#[test]
fn test_invalid_target_names_are_abandoned() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    store.insert_node(Node::new("worker-0"));
    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));

    let cases = [
        ("escape", "../escape.conf"),
        ("nested", "a/b.conf"),
        ("lock", ".dredger.lock"),
    ];
    for (name, target) in cases {
        let created = store
            .create(configuration(name, spec(target, "x", true, None)))
            .unwrap();
        assert_eq!(
            reconciler.reconcile(&created.key()).unwrap(),
            ReconcileOutcome::Abandoned,
            "target {target:?}"
        );
    }
    assert!(!root.path().join("escape.conf").exists());

    // Deleting such records still completes
    for conf in store.list().unwrap() {
        store.delete(&conf.key()).unwrap();
        assert_eq!(
            reconciler.reconcile(&conf.key()).unwrap(),
            ReconcileOutcome::Finalized
        );
    }
    assert!(store.list().unwrap().is_empty());
}

//! End-to-end passes of the Reconciler over real directories

use std::sync::Arc;

use dredger_api::{
    ConditionReason, ConditionStatus, ConditionType, Configuration, Node, ObjectKey,
    find_condition,
};
use dredger_core::{
    ConfigurationStore, DEFAULT_FINALIZER, Error, FileStore, MemoryStore, NodeClient,
    NodeLabelManager, ReconcileOutcome, Reconciler, content_hash_label,
};
use dredger_fs::checksum::content_hash;
use dredger_test_utils::{TestRoot, configuration, spec};
use pretty_assertions::assert_eq;

const NODE_NAME: &str = "worker-0";

fn reconciler(root: &TestRoot, store: Arc<MemoryStore>) -> Reconciler {
    Reconciler::new(store, Arc::new(root.manager()))
}

fn condition(conf: &Configuration, type_: ConditionType) -> (ConditionStatus, ConditionReason) {
    let c = find_condition(&conf.status.conditions, type_).unwrap();
    (c.status, c.reason)
}

#[test]
fn test_full_lifecycle() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());

    let created = store
        .create(configuration("app", spec("app.conf", "a=1\n", true, Some(0o600))))
        .unwrap();
    let key = created.key();

    // Create
    let outcome = reconciler.reconcile(&key).unwrap();
    assert_eq!(outcome, ReconcileOutcome::Synced { status_updated: true });
    assert_eq!(root.read_target("app.conf"), "a=1\n");

    let conf = store.get(&key).unwrap();
    assert_eq!(conf.metadata.finalizers, vec![DEFAULT_FINALIZER.to_string()]);
    let types: Vec<_> = conf.status.conditions.iter().map(|c| c.type_).collect();
    assert_eq!(
        types,
        vec![
            ConditionType::Degraded,
            ConditionType::Progressing,
            ConditionType::Available
        ]
    );
    assert_eq!(
        condition(&conf, ConditionType::Available),
        (ConditionStatus::True, ConditionReason::UpToDate)
    );

    // Update
    let mut changed = conf.clone();
    changed.spec.content = "a=2\n".into();
    store.update(&changed).unwrap();
    reconciler.reconcile(&key).unwrap();
    assert_eq!(root.read_target("app.conf"), "a=2\n");
    assert_eq!(store.get(&key).unwrap().status.content, "a=2\n");

    // Delete
    store.delete(&key).unwrap();
    assert_eq!(reconciler.reconcile(&key).unwrap(), ReconcileOutcome::Finalized);
    root.assert_file_not_exists("app.conf");
    assert!(store.get(&key).unwrap_err().is_not_found());
    root.assert_no_temp_files();
}

#[cfg(unix)]
#[test]
fn test_permission_is_applied() {
    use std::os::unix::fs::PermissionsExt;

    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    let created = store
        .create(configuration("app", spec("app.conf", "x", true, Some(0o600))))
        .unwrap();

    reconciler.reconcile(&created.key()).unwrap();

    let mode = std::fs::metadata(root.files_dir().join("app.conf"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_finalizer_is_stored_before_the_file_is_written() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    let created = store
        .create(configuration("app", spec("app.conf", "x", false, None)))
        .unwrap();

    // create=false keeps the file from ever being written
    let outcome = reconciler.reconcile(&created.key()).unwrap();
    assert_eq!(outcome, ReconcileOutcome::Abandoned);
    assert!(store.get(&created.key()).unwrap().metadata.has_finalizer(DEFAULT_FINALIZER));
    root.assert_file_not_exists("app.conf");
}

#[test]
fn test_existing_file_is_updated_without_create() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    root.write("files/app.conf", "old");
    let created = store
        .create(configuration("app", spec("app.conf", "new", false, None)))
        .unwrap();

    reconciler.reconcile(&created.key()).unwrap();
    assert_eq!(root.read_target("app.conf"), "new");
}

#[test]
fn test_invalid_permission_is_rejected_without_side_effects() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    let created = store
        .create(configuration("app", spec("app.conf", "x", true, Some(0o1777))))
        .unwrap();

    let err = reconciler.reconcile(&created.key()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.get(&created.key()).unwrap(), created);
    root.assert_file_not_exists("app.conf");
}

#[test]
fn test_recoverable_write_failure_is_reported_and_redelivered() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    // A directory in the way makes the rename fail
    std::fs::create_dir_all(root.files_dir().join("app.conf")).unwrap();
    let created = store
        .create(configuration("app", spec("app.conf", "x", true, None)))
        .unwrap();

    let err = reconciler.reconcile(&created.key()).unwrap_err();
    assert!(matches!(err, Error::Sync { .. }));
    assert!(err.is_retryable());

    let conf = store.get(&created.key()).unwrap();
    assert_eq!(
        condition(&conf, ConditionType::Degraded),
        (ConditionStatus::True, ConditionReason::WriteError)
    );
    assert_eq!(
        condition(&conf, ConditionType::Progressing),
        (ConditionStatus::True, ConditionReason::UpdatingContent)
    );
    assert_eq!(
        condition(&conf, ConditionType::Available).0,
        ConditionStatus::False
    );
    root.assert_no_temp_files();

    // Once the obstacle is gone the next pass recovers
    std::fs::remove_dir(root.files_dir().join("app.conf")).unwrap();
    reconciler.reconcile(&created.key()).unwrap();
    let conf = store.get(&created.key()).unwrap();
    assert_eq!(
        condition(&conf, ConditionType::Degraded).0,
        ConditionStatus::False
    );
    assert_eq!(
        condition(&conf, ConditionType::Available).0,
        ConditionStatus::True
    );
}

#[test]
fn test_content_hash_label_follows_the_file() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    store.insert_node(Node::new(NODE_NAME));
    let reconciler = reconciler(&root, store.clone())
        .with_node_labels(NodeLabelManager::new(NODE_NAME, store.clone()));
    let created = store
        .create(configuration("app", spec("app.conf", "a=1\n", true, None)))
        .unwrap();
    let label = content_hash_label("app.conf");

    reconciler.reconcile(&created.key()).unwrap();
    let node = store.get_node(NODE_NAME).unwrap();
    assert_eq!(node.labels[&label], content_hash(b"a=1\n"));

    store.delete(&created.key()).unwrap();
    reconciler.reconcile(&created.key()).unwrap();
    assert!(!store.get_node(NODE_NAME).unwrap().labels.contains_key(&label));
}

#[test]
fn test_deletion_completes_when_the_node_is_gone() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone())
        .with_node_labels(NodeLabelManager::new(NODE_NAME, store.clone()));
    let mut conf = configuration("app", spec("app.conf", "a=1\n", true, None));
    conf.metadata.add_finalizer(DEFAULT_FINALIZER);
    let created = store.create(conf).unwrap();
    root.write("files/app.conf", "a=1\n");

    // No node object: clearing its label has nothing to do
    store.delete(&created.key()).unwrap();
    assert_eq!(
        reconciler.reconcile(&created.key()).unwrap(),
        ReconcileOutcome::Finalized
    );
    root.assert_file_not_exists("app.conf");
    assert!(store.get(&created.key()).unwrap_err().is_not_found());
}

#[test]
fn test_label_failure_marks_progressing() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    // No node registered, so every label update fails
    let reconciler = reconciler(&root, store.clone())
        .with_node_labels(NodeLabelManager::new(NODE_NAME, store.clone()));
    let created = store
        .create(configuration("app", spec("app.conf", "a=1\n", true, None)))
        .unwrap();

    let err = reconciler.reconcile(&created.key()).unwrap_err();
    assert!(matches!(err, Error::Label(_)));
    root.assert_file_exists("app.conf");

    let conf = store.get(&created.key()).unwrap();
    assert_eq!(
        condition(&conf, ConditionType::Progressing),
        (ConditionStatus::True, ConditionReason::UpdatingLabels)
    );
    assert_eq!(
        condition(&conf, ConditionType::Degraded).0,
        ConditionStatus::False
    );
    assert_eq!(
        condition(&conf, ConditionType::Available).0,
        ConditionStatus::False
    );
}

#[test]
fn test_deletion_is_idempotent_when_file_is_already_gone() {
    let root = TestRoot::new();
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler(&root, store.clone());
    let created = store
        .create(configuration("app", spec("app.conf", "x", true, None)))
        .unwrap();
    reconciler.reconcile(&created.key()).unwrap();

    std::fs::remove_file(root.files_dir().join("app.conf")).unwrap();
    store.delete(&created.key()).unwrap();
    assert_eq!(
        reconciler.reconcile(&created.key()).unwrap(),
        ReconcileOutcome::Finalized
    );
}

#[test]
fn test_file_store_backs_the_reconciler() {
    let root = TestRoot::new();
    let store = Arc::new(FileStore::open(root.records_dir()).unwrap());
    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));
    let created = store
        .create(configuration("app", spec("app.conf", "a=1\n", true, None)))
        .unwrap();

    reconciler.reconcile(&created.key()).unwrap();
    root.assert_file_exists("app.conf");

    let reopened = FileStore::open(root.records_dir()).unwrap();
    let conf = reopened.get(&ObjectKey::namespaced("default", "app")).unwrap();
    assert!(conf.status.file_exists);
    assert!(conf.metadata.has_finalizer(DEFAULT_FINALIZER));
}

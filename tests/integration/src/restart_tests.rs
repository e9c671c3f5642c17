//! Behaviour across process restarts: root ownership, crash leftovers and
//! records persisted by the file store

use std::sync::Arc;

use dredger_core::{
    ConfigurationStore, DEFAULT_FINALIZER, FileStore, ReconcileOutcome, Reconciler,
};
use dredger_fs::{ConfigManager, Error as FsError, LOCK_FILE};
use dredger_test_utils::{TestRoot, configuration, spec};
use pretty_assertions::assert_eq;

#[test]
fn test_root_has_a_single_owner() {
    let root = TestRoot::new();
    let first = root.manager();

    let err = ConfigManager::open(root.files_dir()).unwrap_err();
    assert!(matches!(err, FsError::RootInUse { .. }));

    drop(first);
    ConfigManager::open(root.files_dir()).unwrap();
}

#[test]
fn test_clean_all_sweeps_crash_leftovers() {
    let root = TestRoot::new();
    let manager = root.manager();
    root.write("files/.dredger-abc123.tmp", "half written");
    root.write("files/app.conf", "x");

    manager.clean_all().unwrap();

    root.assert_no_temp_files();
    root.assert_file_not_exists("app.conf");
    root.assert_file_exists(LOCK_FILE);
}

#[test]
fn test_deletion_survives_a_restart() {
    let root = TestRoot::new();
    let created = {
        let store = Arc::new(FileStore::open(root.records_dir()).unwrap());
        let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));
        let created = store
            .create(configuration("app", spec("app.conf", "x", true, None)))
            .unwrap();
        reconciler.reconcile(&created.key()).unwrap();
        store.delete(&created.key()).unwrap();
        created
    };

    // The record waits for its finalizer while no reconciler runs
    let store = Arc::new(FileStore::open(root.records_dir()).unwrap());
    let pending = store.get(&created.key()).unwrap();
    assert!(pending.metadata.is_deleting());
    assert_eq!(pending.metadata.finalizers, vec![DEFAULT_FINALIZER.to_string()]);
    root.assert_file_exists("app.conf");

    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));
    assert_eq!(
        reconciler.reconcile(&created.key()).unwrap(),
        ReconcileOutcome::Finalized
    );
    root.assert_file_not_exists("app.conf");
    assert!(store.get(&created.key()).unwrap_err().is_not_found());
}

#[test]
fn test_status_is_not_rewritten_after_restart() {
    let root = TestRoot::new();
    let store = Arc::new(FileStore::open(root.records_dir()).unwrap());
    let created = store
        .create(configuration("app", spec("app.conf", "x", true, None)))
        .unwrap();
    {
        let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));
        reconciler.reconcile(&created.key()).unwrap();
    }

    let reconciler = Reconciler::new(store.clone(), Arc::new(root.manager()));
    assert_eq!(
        reconciler.reconcile(&created.key()).unwrap(),
        ReconcileOutcome::Synced {
            status_updated: false
        }
    );
}

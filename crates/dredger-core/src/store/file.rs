//! Directory-backed object store
//!
//! One YAML document per record. Every operation holds an advisory lock on
//! the directory's lock file, shared for reads and exclusive for writes, so
//! several processes can use the same directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use dredger_api::{Configuration, Node, ObjectKey};
use dredger_fs::{ConfigStore, Error as FsError};
use fs2::FileExt;

use super::{
    CONFIGURATION, ConfigurationStore, NODE, StoreError, StoreResult, Write, apply_create,
    apply_delete, apply_status_update, apply_update, validate_key, validate_segment,
};
use crate::nodelabel::NodeClient;

const LOCK_FILE: &str = ".lock";
const NODES_DIR: &str = "nodes";
const EXTENSION: &str = "yaml";

/// Record store kept as YAML files in a directory.
///
/// Node objects live in the `nodes/` subdirectory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    documents: ConfigStore,
}

impl FileStore {
    /// Open the store at `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        let nodes = dir.join(NODES_DIR);
        fs::create_dir_all(&nodes).map_err(|e| FsError::io(&nodes, e))?;
        Ok(Self {
            dir,
            documents: ConfigStore::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &ObjectKey) -> StoreResult<PathBuf> {
        // Valid segments never contain '_', so the split is unambiguous.
        validate_key(key)?;
        let stem = match &key.namespace {
            Some(ns) => format!("{ns}_{}", key.name),
            None => key.name.clone(),
        };
        Ok(self.dir.join(format!("{stem}.{EXTENSION}")))
    }

    fn node_path(&self, name: &str) -> StoreResult<PathBuf> {
        validate_segment(NODE, name)?;
        Ok(self.dir.join(NODES_DIR).join(format!("{name}.{EXTENSION}")))
    }

    fn lock(&self, exclusive: bool) -> StoreResult<File> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| FsError::io(&path, e))?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| FsError::io(&path, e))?;
        // Lock released when the file is dropped
        Ok(file)
    }

    fn load_record(&self, key: &ObjectKey) -> StoreResult<Configuration> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Err(StoreError::not_found(CONFIGURATION, key));
        }
        Ok(self.documents.load(&path)?)
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        fs::remove_file(path).map_err(|e| FsError::io(path, e))?;
        Ok(())
    }
}

fn next_version(current: &Configuration) -> u64 {
    current.metadata.resource_version + 1
}

impl ConfigurationStore for FileStore {
    fn get(&self, key: &ObjectKey) -> StoreResult<Configuration> {
        let _lock = self.lock(false)?;
        self.load_record(key)
    }

    fn list(&self) -> StoreResult<Vec<Configuration>> {
        let _lock = self.lock(false)?;
        let entries = fs::read_dir(&self.dir).map_err(|e| FsError::io(&self.dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| FsError::io(&self.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .iter()
            .map(|path| self.documents.load(path).map_err(StoreError::from))
            .collect()
    }

    fn create(&self, conf: Configuration) -> StoreResult<Configuration> {
        let _lock = self.lock(true)?;
        let path = self.record_path(&conf.key())?;
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                kind: CONFIGURATION,
                key: conf.key().to_string(),
            });
        }
        let created = apply_create(conf, 1);
        self.documents.save(&path, &created)?;
        Ok(created)
    }

    fn update(&self, conf: &Configuration) -> StoreResult<Configuration> {
        let _lock = self.lock(true)?;
        let key = conf.key();
        let current = self.load_record(&key)?;

        match apply_update(&current, conf, next_version(&current))? {
            Write::Store(next) => {
                self.documents.save(&self.record_path(&key)?, &next)?;
                Ok(next)
            }
            Write::Erase(last) => {
                self.remove(&self.record_path(&key)?)?;
                Ok(last)
            }
        }
    }

    fn update_status(&self, conf: &Configuration) -> StoreResult<Configuration> {
        let _lock = self.lock(true)?;
        let key = conf.key();
        let current = self.load_record(&key)?;

        let next = apply_status_update(&current, conf, next_version(&current))?;
        self.documents.save(&self.record_path(&key)?, &next)?;
        Ok(next)
    }

    fn delete(&self, key: &ObjectKey) -> StoreResult<()> {
        let _lock = self.lock(true)?;
        let current = self.load_record(key)?;

        match apply_delete(&current, next_version(&current)) {
            Write::Store(next) => self.documents.save(&self.record_path(key)?, &next)?,
            Write::Erase(_) => self.remove(&self.record_path(key)?)?,
        }
        Ok(())
    }
}

impl NodeClient for FileStore {
    fn get_node(&self, name: &str) -> StoreResult<Node> {
        let path = self.node_path(name)?;
        let _lock = self.lock(false)?;
        if !path.exists() {
            return Err(StoreError::not_found(NODE, name));
        }
        Ok(self.documents.load(&path)?)
    }

    fn update_node(&self, node: &Node) -> StoreResult<Node> {
        let path = self.node_path(&node.name)?;
        let _lock = self.lock(true)?;
        if !path.exists() {
            return Err(StoreError::not_found(NODE, &node.name));
        }
        let current: Node = self.documents.load(&path)?;
        if current.resource_version != node.resource_version {
            return Err(StoreError::Conflict {
                kind: NODE,
                key: node.name.clone(),
                expected: node.resource_version,
                found: current.resource_version,
            });
        }

        let mut next = node.clone();
        next.resource_version += 1;
        self.documents.save(&path, &next)?;
        Ok(next)
    }
}

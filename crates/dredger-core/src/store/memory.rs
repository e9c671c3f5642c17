//! In-process object store

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use dredger_api::{Configuration, Node, ObjectKey};

use super::{
    CONFIGURATION, ConfigurationStore, NODE, StoreError, StoreResult, Write, apply_create,
    apply_delete, apply_status_update, apply_update, validate_key,
};
use crate::nodelabel::NodeClient;

#[derive(Debug, Default)]
struct State {
    configurations: BTreeMap<ObjectKey, Configuration>,
    nodes: BTreeMap<String, Node>,
    version: u64,
}

impl State {
    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

/// Thread-safe store holding records and nodes in memory.
///
/// Resource versions come from one counter shared by every object.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node object.
    pub fn insert_node(&self, mut node: Node) -> Node {
        let mut state = self.write();
        node.resource_version = state.next_version();
        state.nodes.insert(node.name.clone(), node.clone());
        node
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigurationStore for MemoryStore {
    fn get(&self, key: &ObjectKey) -> StoreResult<Configuration> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .configurations
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(CONFIGURATION, key))
    }

    fn list(&self) -> StoreResult<Vec<Configuration>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.configurations.values().cloned().collect())
    }

    fn create(&self, conf: Configuration) -> StoreResult<Configuration> {
        let key = conf.key();
        validate_key(&key)?;
        let mut state = self.write();
        if state.configurations.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: CONFIGURATION,
                key: key.to_string(),
            });
        }
        let version = state.next_version();
        let created = apply_create(conf, version);
        state.configurations.insert(key, created.clone());
        Ok(created)
    }

    fn update(&self, conf: &Configuration) -> StoreResult<Configuration> {
        let mut state = self.write();
        let key = conf.key();
        let current = state
            .configurations
            .get(&key)
            .ok_or_else(|| StoreError::not_found(CONFIGURATION, &key))?
            .clone();
        let version = state.next_version();

        match apply_update(&current, conf, version)? {
            Write::Store(next) => {
                state.configurations.insert(key, next.clone());
                Ok(next)
            }
            Write::Erase(last) => {
                state.configurations.remove(&key);
                Ok(last)
            }
        }
    }

    fn update_status(&self, conf: &Configuration) -> StoreResult<Configuration> {
        let mut state = self.write();
        let key = conf.key();
        let current = state
            .configurations
            .get(&key)
            .ok_or_else(|| StoreError::not_found(CONFIGURATION, &key))?
            .clone();
        let version = state.next_version();

        let next = apply_status_update(&current, conf, version)?;
        state.configurations.insert(key, next.clone());
        Ok(next)
    }

    fn delete(&self, key: &ObjectKey) -> StoreResult<()> {
        let mut state = self.write();
        let current = state
            .configurations
            .get(key)
            .ok_or_else(|| StoreError::not_found(CONFIGURATION, key))?
            .clone();
        let version = state.next_version();

        match apply_delete(&current, version) {
            Write::Store(next) => {
                state.configurations.insert(key.clone(), next);
            }
            Write::Erase(_) => {
                state.configurations.remove(key);
            }
        }
        Ok(())
    }
}

impl NodeClient for MemoryStore {
    fn get_node(&self, name: &str) -> StoreResult<Node> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(NODE, name))
    }

    fn update_node(&self, node: &Node) -> StoreResult<Node> {
        let mut state = self.write();
        let found = state
            .nodes
            .get(&node.name)
            .ok_or_else(|| StoreError::not_found(NODE, &node.name))?
            .resource_version;
        if found != node.resource_version {
            return Err(StoreError::Conflict {
                kind: NODE,
                key: node.name.clone(),
                expected: node.resource_version,
                found,
            });
        }

        let mut next = node.clone();
        next.resource_version = state.next_version();
        state.nodes.insert(next.name.clone(), next.clone());
        Ok(next)
    }
}

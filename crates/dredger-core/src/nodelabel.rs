//! Node labels mirroring configuration content hashes
//!
//! [`NodeLabelManager`] handles the labels of a single node object. Only
//! keys under the [`CONTENT_HASH_V1`] prefix are accepted.

use std::sync::Arc;

use dredger_api::Node;

use crate::store::{StoreError, StoreResult};

/// Label key prefix for content hashes. Values are only comparable for
/// equality.
pub const CONTENT_HASH_V1: &str = "contenthashv1.config.dredger.io";

/// Label key holding the content hash of `target_name`.
pub fn content_hash_label(target_name: &str) -> String {
    format!("{CONTENT_HASH_V1}/{target_name}")
}

/// Whether `key` can be handled by a [`NodeLabelManager`].
pub fn is_valid_key(key: &str) -> bool {
    key.starts_with(CONTENT_HASH_V1)
}

/// Access to node objects in the control plane.
pub trait NodeClient: Send + Sync {
    fn get_node(&self, name: &str) -> StoreResult<Node>;

    /// Persist labels. Fails with a conflict if `node` is stale.
    fn update_node(&self, node: &Node) -> StoreResult<Node>;
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("unsupported label key {key:?}")]
    UnknownKey { key: String },

    #[error("failed to update labels of node {node}: {source}")]
    Node {
        node: String,
        #[source]
        source: StoreError,
    },
}

/// Manages the configuration labels on one node object.
#[derive(Clone)]
pub struct NodeLabelManager {
    node_name: String,
    client: Arc<dyn NodeClient>,
}

impl std::fmt::Debug for NodeLabelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeLabelManager")
            .field("node_name", &self.node_name)
            .finish_non_exhaustive()
    }
}

impl NodeLabelManager {
    pub fn new(node_name: impl Into<String>, client: Arc<dyn NodeClient>) -> Self {
        Self {
            node_name: node_name.into(),
            client,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Set `key` to `value` on the node.
    pub fn set(&self, key: &str, value: &str) -> Result<(), LabelError> {
        check_key(key)?;
        let mut node = self.fetch()?;
        if node.labels.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        node.labels.insert(key.to_string(), value.to_string());
        self.store(&node)?;
        tracing::debug!(node = %self.node_name, key, "label set");
        Ok(())
    }

    /// The value of `key`, or `None` when the node does not carry it.
    pub fn get(&self, key: &str) -> Result<Option<String>, LabelError> {
        check_key(key)?;
        Ok(self.fetch()?.labels.get(key).cloned())
    }

    /// Remove `key` from the node. Absent keys, and an absent node, are not
    /// an error.
    pub fn clear(&self, key: &str) -> Result<(), LabelError> {
        check_key(key)?;
        let mut node = match self.client.get_node(&self.node_name) {
            Ok(node) => node,
            Err(e) if e.is_not_found() => {
                tracing::debug!(node = %self.node_name, key, "node gone, no label to clear");
                return Ok(());
            }
            Err(source) => return Err(self.node_error(source)),
        };
        if node.labels.remove(key).is_none() {
            return Ok(());
        }
        self.store(&node)?;
        tracing::debug!(node = %self.node_name, key, "label cleared");
        Ok(())
    }

    fn fetch(&self) -> Result<Node, LabelError> {
        self.client
            .get_node(&self.node_name)
            .map_err(|source| self.node_error(source))
    }

    fn store(&self, node: &Node) -> Result<Node, LabelError> {
        self.client
            .update_node(node)
            .map_err(|source| self.node_error(source))
    }

    fn node_error(&self, source: StoreError) -> LabelError {
        LabelError::Node {
            node: self.node_name.clone(),
            source,
        }
    }
}

fn check_key(key: &str) -> Result<(), LabelError> {
    if !is_valid_key(key) {
        return Err(LabelError::UnknownKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

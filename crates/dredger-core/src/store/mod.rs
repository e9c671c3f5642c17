//! Object store for desired-state records
//!
//! The reconciler reads and persists records through [`ConfigurationStore`].
//! Writes use optimistic concurrency: an update carrying a stale
//! `resource_version` fails with [`StoreError::Conflict`].
//!
//! Deletion follows the finalizer protocol. Deleting a record that still
//! carries finalizers only stamps its `deletion_timestamp`; the record is
//! erased once an update removes the last finalizer.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::Utc;
use dredger_api::{Configuration, ObjectKey};
use uuid::Uuid;

pub(crate) const CONFIGURATION: &str = "Configuration";
pub(crate) const NODE: &str = "Node";

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by object stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("conflict updating {kind} {key}: expected version {expected}, found {found}")]
    Conflict {
        kind: &'static str,
        key: String,
        expected: u64,
        found: u64,
    },

    #[error("invalid {kind} key {key:?}: {reason}")]
    InvalidKey {
        kind: &'static str,
        key: String,
        reason: &'static str,
    },

    /// Filesystem error from a file-backed store
    #[error(transparent)]
    Fs(#[from] dredger_fs::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }
}

/// Longest accepted namespace, name or node name.
pub const MAX_SEGMENT_LEN: usize = 253;

/// Check that every part of `key` is a valid object name segment.
pub fn validate_key(key: &ObjectKey) -> StoreResult<()> {
    if let Some(ns) = &key.namespace {
        validate_segment(CONFIGURATION, ns)?;
    }
    validate_segment(CONFIGURATION, &key.name)
}

/// Object names are lowercase alphanumerics, '-' and '.', starting and
/// ending alphanumeric. They map one-to-one onto file names.
pub(crate) fn validate_segment(kind: &'static str, segment: &str) -> StoreResult<()> {
    let reason = if segment.is_empty() {
        Some("must not be empty")
    } else if segment.len() > MAX_SEGMENT_LEN {
        Some("is too long")
    } else if !segment
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        Some("may only contain lowercase letters, digits, '-' and '.'")
    } else if !segment.starts_with(|c: char| c.is_ascii_alphanumeric())
        || !segment.ends_with(|c: char| c.is_ascii_alphanumeric())
    {
        Some("must start and end with a letter or digit")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            kind,
            key: segment.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Persistence for [`Configuration`] records.
pub trait ConfigurationStore: Send + Sync {
    /// Fetch one record.
    fn get(&self, key: &ObjectKey) -> StoreResult<Configuration>;

    /// Every record in the store.
    fn list(&self) -> StoreResult<Vec<Configuration>>;

    /// Insert a new record. The store assigns uid and version.
    fn create(&self, conf: Configuration) -> StoreResult<Configuration>;

    /// Persist metadata and spec. Status is left as stored.
    ///
    /// Returns the record as written. When the update removes the last
    /// finalizer of a record being deleted, the record is erased and the
    /// final state is returned.
    fn update(&self, conf: &Configuration) -> StoreResult<Configuration>;

    /// Persist status only.
    fn update_status(&self, conf: &Configuration) -> StoreResult<Configuration>;

    /// Request deletion.
    fn delete(&self, key: &ObjectKey) -> StoreResult<()>;
}

/// What a write does to the stored copy.
#[derive(Debug)]
pub(crate) enum Write {
    Store(Configuration),
    Erase(Configuration),
}

fn check_version(current: &Configuration, incoming: &Configuration) -> StoreResult<()> {
    let (expected, found) = (incoming.metadata.resource_version, current.metadata.resource_version);
    if expected != found {
        return Err(StoreError::Conflict {
            kind: CONFIGURATION,
            key: current.key().to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

pub(crate) fn apply_create(mut conf: Configuration, version: u64) -> Configuration {
    conf.metadata.uid = Uuid::new_v4().to_string();
    conf.metadata.resource_version = version;
    conf.metadata.deletion_timestamp = None;
    conf
}

pub(crate) fn apply_update(
    current: &Configuration,
    incoming: &Configuration,
    version: u64,
) -> StoreResult<Write> {
    check_version(current, incoming)?;

    let mut next = current.clone();
    next.metadata.finalizers = incoming.metadata.finalizers.clone();
    next.spec = incoming.spec.clone();
    next.metadata.resource_version = version;

    if next.metadata.is_deleting() && next.metadata.finalizers.is_empty() {
        return Ok(Write::Erase(next));
    }
    Ok(Write::Store(next))
}

pub(crate) fn apply_status_update(
    current: &Configuration,
    incoming: &Configuration,
    version: u64,
) -> StoreResult<Configuration> {
    check_version(current, incoming)?;

    let mut next = current.clone();
    next.status = incoming.status.clone();
    next.metadata.resource_version = version;
    Ok(next)
}

pub(crate) fn apply_delete(current: &Configuration, version: u64) -> Write {
    if current.metadata.finalizers.is_empty() {
        return Write::Erase(current.clone());
    }
    let mut next = current.clone();
    if next.metadata.deletion_timestamp.is_none() {
        next.metadata.deletion_timestamp = Some(Utc::now());
        next.metadata.resource_version = version;
    }
    Write::Store(next)
}

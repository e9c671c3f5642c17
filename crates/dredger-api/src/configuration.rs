//! The `Configuration` record: one file, on one node

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::{ObjectKey, ObjectMeta};

/// Desired state of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSpec {
    /// Name of the file within the configuration root
    pub target_name: String,
    /// Content to be written to the file
    #[serde(default)]
    pub content: String,
    /// Whether to create the file if it does not exist
    #[serde(default)]
    pub create: bool,
    /// UNIX permission bit mask (example: 0o644) the file should have
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<u32>,
}

/// Observed state of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStatus {
    /// Last time the file was updated
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Current content of the file
    #[serde(default)]
    pub content: String,
    /// Whether the file exists
    #[serde(default)]
    pub file_exists: bool,
    /// One condition per type, in a fixed order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A desired-state record together with its observed status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub metadata: ObjectMeta,
    pub spec: ConfigurationSpec,
    #[serde(default)]
    pub status: ConfigurationStatus,
}

impl Configuration {
    pub fn new(key: &ObjectKey, spec: ConfigurationSpec) -> Self {
        Self {
            metadata: ObjectMeta::new(key),
            spec,
            status: ConfigurationStatus::default(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }
}

//! Runtime settings for the reconciler
//!
//! Settings files may be TOML, YAML or JSON, chosen by extension. Every
//! field has a default, so an empty file (or no file) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dredger_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::reconciler::DEFAULT_FINALIZER;

fn default_config_root() -> PathBuf {
    PathBuf::from("/var/lib/dredger/files")
}

fn default_records_dir() -> PathBuf {
    PathBuf::from("/var/lib/dredger/records")
}

fn default_node_name() -> String {
    "localhost".to_string()
}

fn default_finalizer() -> String {
    DEFAULT_FINALIZER.to_string()
}

fn default_retry_max_elapsed_secs() -> u64 {
    30
}

/// Reconciler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory owned by the config manager
    #[serde(default = "default_config_root")]
    pub config_root: PathBuf,

    /// Directory of the file-backed record store
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,

    /// Node whose labels mirror content hashes
    #[serde(default = "default_node_name")]
    pub node_name: String,

    #[serde(default = "default_finalizer")]
    pub finalizer: String,

    /// Wipe the config root before the first pass
    #[serde(default)]
    pub clean_on_start: bool,

    /// Publish content hashes as node labels
    #[serde(default)]
    pub label_sync: bool,

    /// Upper bound on redelivery of retryable failures
    #[serde(default = "default_retry_max_elapsed_secs")]
    pub retry_max_elapsed_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_root: default_config_root(),
            records_dir: default_records_dir(),
            node_name: default_node_name(),
            finalizer: default_finalizer(),
            clean_on_start: false,
            label_sync: false,
            retry_max_elapsed_secs: default_retry_max_elapsed_secs(),
        }
    }
}

impl Settings {
    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Self = ConfigStore::new().load(path)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Load settings from `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_secs(self.retry_max_elapsed_secs)
    }
}

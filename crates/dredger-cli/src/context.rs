//! Settings resolution and wiring of the reconciler parts

use std::sync::Arc;

use dredger_core::{FileStore, NodeLabelManager, Reconciler, Settings};
use dredger_fs::ConfigManager;

use crate::cli::Cli;
use crate::error::Result;

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
}

impl Context {
    /// Load the settings file, if any, then apply command-line overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut settings = Settings::load_or_default(cli.config.as_deref())?;
        if let Some(root) = &cli.root {
            settings.config_root = root.clone();
        }
        if let Some(records) = &cli.records {
            settings.records_dir = records.clone();
        }
        if let Some(node) = &cli.node {
            settings.node_name = node.clone();
        }
        tracing::debug!(?settings, "settings resolved");
        Ok(Self { settings })
    }

    pub fn store(&self) -> Result<Arc<FileStore>> {
        Ok(Arc::new(FileStore::open(&self.settings.records_dir)?))
    }

    /// Take ownership of the configuration root.
    pub fn manager(&self) -> Result<Arc<ConfigManager>> {
        Ok(Arc::new(ConfigManager::open(&self.settings.config_root)?))
    }

    pub fn reconciler(&self, store: Arc<FileStore>, manager: Arc<ConfigManager>) -> Reconciler {
        let reconciler =
            Reconciler::new(store.clone(), manager).with_finalizer(&self.settings.finalizer);
        if self.settings.label_sync {
            reconciler.with_node_labels(NodeLabelManager::new(&self.settings.node_name, store))
        } else {
            reconciler
        }
    }
}

//! One reconciliation pass for one record
//!
//! [`Reconciler::reconcile`] moves the node's file closer to the record's
//! desired state and reports what it observed. Passes are independent and
//! safe to interrupt and redeliver: the only durable effects are the
//! manager's atomic writes and deletes and the record updates, each of
//! which is idempotent.
//!
//! The finalizer is installed strictly before the first write, so every
//! file created for a record is guaranteed a cleanup pass when the record
//! is deleted.

use std::sync::Arc;

use dredger_api::{Configuration, ConfigurationSpec, ObjectKey};
use dredger_fs::{ConfigManager, ConfigRequest, checksum};

use crate::conditions::{derive_status, statuses_are_equal};
use crate::lifecycle::Lifecycle;
use crate::nodelabel::{LabelError, NodeLabelManager, content_hash_label};
use crate::store::ConfigurationStore;
use crate::validate::validate;
use crate::{Error, Result};

/// Finalizer placed on every record this reconciler manages.
pub const DEFAULT_FINALIZER: &str = "config.dredger.io/finalizer";

/// What a successful pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record no longer exists
    Gone,
    /// The record is being deleted and was already cleaned up
    Skipped,
    /// The file was removed and the finalizer released
    Finalized,
    /// The request can never succeed as written; status left untouched
    Abandoned,
    /// The file was synchronized
    Synced { status_updated: bool },
}

/// Reconciles `Configuration` records against a [`ConfigManager`].
pub struct Reconciler {
    store: Arc<dyn ConfigurationStore>,
    manager: Arc<ConfigManager>,
    labels: Option<NodeLabelManager>,
    finalizer: String,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ConfigurationStore>, manager: Arc<ConfigManager>) -> Self {
        Self {
            store,
            manager,
            labels: None,
            finalizer: DEFAULT_FINALIZER.to_string(),
        }
    }

    pub fn with_finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.finalizer = finalizer.into();
        self
    }

    /// Mirror each file's content hash onto the node's labels.
    pub fn with_node_labels(mut self, labels: NodeLabelManager) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn finalizer(&self) -> &str {
        &self.finalizer
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }

    /// Run one pass for the record at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error whenever the pass should be redelivered, and for
    /// validation failures, which need the record to be corrected first.
    pub fn reconcile(&self, key: &ObjectKey) -> Result<ReconcileOutcome> {
        let span = tracing::info_span!("reconcile", key = %key);
        let _enter = span.enter();

        let conf = match self.store.get(key) {
            Ok(conf) => Some(conf),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        let lifecycle = Lifecycle::classify(conf, &self.finalizer);
        if let Some(conf) = lifecycle.record() {
            validate(&conf.spec)?;
        }

        match lifecycle {
            Lifecycle::Gone => {
                tracing::debug!("record gone, nothing to do");
                Ok(ReconcileOutcome::Gone)
            }
            Lifecycle::Deleting {
                finalized: false, ..
            } => Ok(ReconcileOutcome::Skipped),
            Lifecycle::Deleting {
                conf,
                finalized: true,
            } => self.finalize(*conf),
            Lifecycle::Active { conf, finalized } => self.converge(*conf, finalized),
        }
    }

    fn finalize(&self, mut conf: Configuration) -> Result<ReconcileOutcome> {
        let target = conf.spec.target_name.clone();
        self.manager
            .delete(&target)
            .map_err(|source| Error::Delete {
                target: target.clone(),
                source,
            })?;

        if let Some(labels) = &self.labels {
            labels.clear(&content_hash_label(&target))?;
        }

        conf.metadata.remove_finalizer(&self.finalizer);
        self.store.update(&conf)?;
        tracing::info!(target_name = %target, "configuration removed, finalizer released");
        Ok(ReconcileOutcome::Finalized)
    }

    fn converge(&self, mut conf: Configuration, finalized: bool) -> Result<ReconcileOutcome> {
        if !finalized {
            conf.metadata.add_finalizer(&self.finalizer);
            conf = self.store.update(&conf)?;
            tracing::debug!(finalizer = %self.finalizer, "finalizer added");
        }

        let old_status = conf.status.clone();
        let request = request_from_spec(&conf.spec);

        let synced = self.manager.synchronize(&request);
        if let Err(e) = &synced {
            if e.is_non_recoverable() {
                tracing::error!(error = %e, "non-recoverable error handling configuration");
                return Ok(ReconcileOutcome::Abandoned);
            }
        }

        let label_error = match (&synced, &self.labels) {
            (Ok(()), Some(labels)) => self.publish_hash(labels, &request).err(),
            _ => None,
        };

        let outcome = self.manager.status(&request.target_name);
        tracing::debug!(
            target_name = %request.target_name,
            file_exists = outcome.file_exists,
            last_write_error = ?outcome.last_write_error,
            "file status"
        );
        conf.status = derive_status(
            &conf.spec,
            &outcome,
            label_error.as_ref().map(|e| e as &dyn std::error::Error),
        );

        let status_updated = self.write_status(&conf, &old_status)?;

        if let Err(source) = synced {
            return Err(Error::Sync {
                target: request.target_name,
                source,
            });
        }
        if let Some(e) = label_error {
            return Err(e.into());
        }
        Ok(ReconcileOutcome::Synced { status_updated })
    }

    fn publish_hash(
        &self,
        labels: &NodeLabelManager,
        request: &ConfigRequest,
    ) -> std::result::Result<(), LabelError> {
        let hash = checksum::content_hash(request.content.as_bytes());
        labels
            .set(&content_hash_label(&request.target_name), &hash)
            .inspect_err(|e| tracing::warn!(error = %e, "failed to publish content hash"))
    }

    fn write_status(
        &self,
        conf: &Configuration,
        old_status: &dredger_api::ConfigurationStatus,
    ) -> Result<bool> {
        if statuses_are_equal(old_status, &conf.status) {
            tracing::debug!("status unchanged, skipping update");
            return Ok(false);
        }

        match self.store.update_status(conf) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::debug!("record vanished before status update");
                Ok(false)
            }
            Err(source) => {
                tracing::error!(error = %source, "failed to update configuration status");
                Err(Error::StatusUpdate {
                    key: conf.key(),
                    source,
                })
            }
        }
    }
}

/// Translate the wire spec into a manager request.
pub fn request_from_spec(spec: &ConfigurationSpec) -> ConfigRequest {
    ConfigRequest {
        target_name: spec.target_name.clone(),
        content: spec.content.clone(),
        create: spec.create,
        permission: spec.permission,
    }
}

//! Error types for dredger-core

use dredger_api::ObjectKey;

use crate::nodelabel::LabelError;
use crate::store::StoreError;
use crate::validate::ValidationError;

/// Result type for dredger-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a reconciliation pass
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The desired state is malformed; the operator must correct it
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Writing the target file failed
    #[error("failed to synchronize the configuration {target:?}: {source}")]
    Sync {
        target: String,
        #[source]
        source: dredger_fs::Error,
    },

    /// Removing the target file failed during deletion
    #[error("failed to delete the configuration {target:?}: {source}")]
    Delete {
        target: String,
        #[source]
        source: dredger_fs::Error,
    },

    /// Writing the observed status back failed
    #[error("could not update status for object {key}: {source}")]
    StatusUpdate {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    /// Object store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Node label error
    #[error(transparent)]
    Label(#[from] LabelError),

    /// Filesystem error from dredger-fs
    #[error(transparent)]
    Fs(#[from] dredger_fs::Error),
}

impl Error {
    /// Whether redelivering the same record may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Sync { source, .. } | Self::Fs(source) => !source.is_non_recoverable(),
            Self::Store(source) | Self::StatusUpdate { source, .. } => !source.is_invalid_key(),
            _ => true,
        }
    }
}

//! Error types for dredger-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from dredger-core
    #[error(transparent)]
    Core(#[from] dredger_core::Error),

    /// Error from the record store
    #[error(transparent)]
    Store(#[from] dredger_core::StoreError),

    /// Error from dredger-fs
    #[error(transparent)]
    Fs(#[from] dredger_fs::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

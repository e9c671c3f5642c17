//! Error types for dredger-fs

use std::path::PathBuf;

/// Result type for dredger-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dredger-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path} does not exist and creation is not allowed")]
    CreationNotAllowed { path: PathBuf },

    #[error("invalid target name {name:?}: {reason}")]
    InvalidTargetName { name: String, reason: &'static str },

    #[error("configuration root {path} is already owned by another manager")]
    RootInUse { path: PathBuf },

    #[error("failed to remove {} entries: {}", .errors.len(), join_messages(.errors))]
    Reset { errors: Vec<Error> },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when retrying the same request cannot succeed.
    ///
    /// The request parameters must change first. Every other error is
    /// recoverable and safe to retry unchanged.
    pub fn is_non_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CreationNotAllowed { .. } | Self::InvalidTargetName { .. }
        )
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_are_non_recoverable() {
        let err = Error::CreationNotAllowed {
            path: PathBuf::from("/etc/app/x.conf"),
        };
        assert!(err.is_non_recoverable());

        let err = Error::InvalidTargetName {
            name: "../x".into(),
            reason: "must be a single path component",
        };
        assert!(err.is_non_recoverable());
    }

    #[test]
    fn io_errors_are_recoverable() {
        let err = Error::io(
            "/etc/app/x.conf",
            std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"),
        );
        assert!(!err.is_non_recoverable());
    }

    #[test]
    fn reset_error_lists_every_failure() {
        let err = Error::Reset {
            errors: vec![
                Error::io("a", std::io::Error::other("busy")),
                Error::io("b", std::io::Error::other("denied")),
            ],
        };
        let display = err.to_string();
        assert!(display.starts_with("failed to remove 2 entries"));
        assert!(display.contains("busy"));
        assert!(display.contains("denied"));
    }
}

//! Semantic validation of desired state
//!
//! Runs before any I/O. A failure aborts the pass without touching storage
//! or the record's finalizers.

use dredger_api::ConfigurationSpec;

/// User, group and other read-write-execute bits.
pub const PERMISSION_BITS: u32 = 0o777;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("target name can't be empty")]
    MissingTargetName,

    #[error("requested permissions {permission:#o} are not a valid UNIX permission set")]
    InvalidPermission { permission: u32 },
}

/// Check that `spec` is semantically correct.
pub fn validate(spec: &ConfigurationSpec) -> Result<(), ValidationError> {
    if spec.target_name.is_empty() {
        return Err(ValidationError::MissingTargetName);
    }
    if let Some(permission) = spec.permission {
        valid_permission(permission)?;
    }
    Ok(())
}

// No spurious bits: file-type, setuid/setgid and sticky are all rejected.
fn valid_permission(permission: u32) -> Result<(), ValidationError> {
    if permission & !PERMISSION_BITS != 0 {
        return Err(ValidationError::InvalidPermission { permission });
    }
    Ok(())
}

//! Target name resolution under a configuration root

use std::path::{Component, Path, PathBuf};

use crate::io::RESERVED_PREFIX;
use crate::{Error, Result};

/// Resolve `name` to a path directly under `root`.
///
/// A target name must be a single normal path component. Separators, `.`,
/// `..`, absolute paths and the reserved bookkeeping prefix are rejected
/// with a non-recoverable [`Error::InvalidTargetName`].
pub fn resolve_target(root: &Path, name: &str) -> Result<PathBuf> {
    let invalid = |reason| Error::InvalidTargetName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(invalid("must be a single path component"));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(invalid("uses a prefix reserved for internal files"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(name)),
        _ => Err(invalid("must be a single path component")),
    }
}

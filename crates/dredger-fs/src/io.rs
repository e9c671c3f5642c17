//! Atomic I/O operations

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{Error, Result};

/// Prefix of every file the crate creates for its own bookkeeping.
///
/// Target names using it are rejected so managed content never collides
/// with temporary or lock files.
pub const RESERVED_PREFIX: &str = ".dredger";

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename: the temporary file is created next to
/// `path` (same filesystem, so the rename is atomic), filled, flushed,
/// given `mode` when one is requested and renamed over the target. Readers
/// observe either the previous complete file or the new one.
///
/// The temporary file is consumed by the rename on success and removed on
/// every error path.
pub fn write_atomic(path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(&format!("{RESERVED_PREFIX}-"))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    tracing::debug!(temp = %temp.path().display(), "created temporary file");

    temp.write_all(content)
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;

    if let Some(mode) = mode {
        tracing::debug!(mode = %format!("{mode:o}"), "setting permissions");
        set_mode(temp.path(), mode)?;
    }

    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Read a file as text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), None)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))
}

// Only the owner-write bit maps onto non-unix permissions.
#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)
        .map_err(|e| Error::io(path, e))?
        .permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms).map_err(|e| Error::io(path, e))
}

//! SHA-256 content hashing
//!
//! Hashes are plain lowercase hex so they can be used verbatim as label
//! values. Only compare them for equality.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Compute the SHA-256 hash of in-memory content.
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Compute the SHA-256 hash of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_hash(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(content_hash(&content))
}

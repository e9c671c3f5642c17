//! The configuration manager
//!
//! A [`ConfigManager`] owns a configuration root exclusively. It is the sole
//! writer of that subtree: content it did not create may be replaced or
//! removed at any time. Each target file is identified by a name relative to
//! the root and converged with [`ConfigManager::synchronize`].

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;

use crate::io::{self, RESERVED_PREFIX};
use crate::path::resolve_target;
use crate::{Error, Result};

/// Permission applied when a request does not carry one (`rw-r--r--`).
pub const DEFAULT_PERMISSION: u32 = 0o644;

/// Name of the advisory lock file that marks a root as owned.
pub const LOCK_FILE: &str = ".dredger.lock";

/// A request to converge one target file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRequest {
    /// File name relative to the manager's root
    pub target_name: String,
    /// Exact bytes the file must contain
    pub content: String,
    /// Whether a missing file may be created
    pub create: bool,
    /// UNIX permission bits; [`DEFAULT_PERMISSION`] when absent
    pub permission: Option<u32>,
}

/// What the manager last observed for one target name.
///
/// Only `last_write_error` is remembered between calls. Existence, content
/// and modification time are read from storage every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Human-readable form of the most recent failure, if any
    pub last_write_error: Option<String>,
    /// True when the file exists, even if its content is out of sync
    pub file_exists: bool,
    /// Content currently on storage
    pub content: String,
    /// Modification time of the file, `None` when it does not exist
    pub last_updated: Option<DateTime<Utc>>,
}

/// Exclusive owner of a configuration root.
#[derive(Debug)]
pub struct ConfigManager {
    root: PathBuf,
    errors: RwLock<HashMap<String, String>>,
    // Held for the manager's lifetime; dropping it releases the root.
    _lock: File,
}

impl ConfigManager {
    /// Take ownership of `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootInUse`] if another manager, in this process or
    /// another one, already owns the root.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;

        let lock_path = root.join(LOCK_FILE);
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(&lock_path, e))?;
        lock.try_lock_exclusive().map_err(|e| {
            if e.kind() == std::io::ErrorKind::WouldBlock {
                Error::RootInUse { path: root.clone() }
            } else {
                Error::io(&lock_path, e)
            }
        })?;

        tracing::debug!(root = %root.display(), "configuration root acquired");
        Ok(Self {
            root,
            errors: RwLock::new(HashMap::new()),
            _lock: lock,
        })
    }

    /// The canonical root this manager owns.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Converge the target file with `request`.
    ///
    /// Once it returns the operation is complete. The outcome, success or
    /// failure, replaces whatever was recorded for the target name before.
    ///
    /// # Errors
    ///
    /// - [`Error::CreationNotAllowed`] (non-recoverable) when the file is
    ///   missing and `create` is false. Nothing is written.
    /// - [`Error::InvalidTargetName`] (non-recoverable).
    /// - [`Error::Io`] (recoverable) for any other failure.
    pub fn synchronize(&self, request: &ConfigRequest) -> Result<()> {
        let result = self.write_target(request);
        self.record(&request.target_name, result.as_ref().err());
        result
    }

    fn write_target(&self, request: &ConfigRequest) -> Result<()> {
        let path = resolve_target(&self.root, &request.target_name)?;
        let exists = path.try_exists().map_err(|e| Error::io(&path, e))?;
        if !exists && !request.create {
            return Err(Error::CreationNotAllowed { path });
        }

        let mode = request.permission.unwrap_or(DEFAULT_PERMISSION);
        tracing::info!(path = %path.display(), mode = %format!("{mode:o}"), "updating configuration file");
        io::write_atomic(&path, request.content.as_bytes(), Some(mode))?;
        tracing::info!(path = %path.display(), "configuration updated");
        Ok(())
    }

    /// Remove the target file.
    ///
    /// A file that is already absent counts as removed. Names that could
    /// never have been written are treated the same way.
    ///
    /// # Errors
    ///
    /// Any other removal failure is recorded for the name and returned.
    pub fn delete(&self, target_name: &str) -> Result<()> {
        let path = match resolve_target(&self.root, target_name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(target_name, error = %e, "nothing to delete for invalid target name");
                self.record(target_name, None);
                return Ok(());
            }
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "configuration deleted");
                self.record(target_name, None);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "configuration already absent");
                self.record(target_name, None);
                Ok(())
            }
            Err(e) => {
                let err = Error::io(&path, e);
                self.record(target_name, Some(&err));
                Err(err)
            }
        }
    }

    /// Report the current state of the target file. Never fails.
    ///
    /// Returns the zero value for a name that was never used and whose
    /// file does not exist.
    pub fn status(&self, target_name: &str) -> SyncOutcome {
        let mut outcome = SyncOutcome {
            last_write_error: self.last_error(target_name),
            ..SyncOutcome::default()
        };

        let Ok(path) = resolve_target(&self.root, target_name) else {
            return outcome;
        };
        let Ok(metadata) = fs::metadata(&path) else {
            return outcome;
        };
        outcome.last_updated = metadata.modified().ok().map(DateTime::<Utc>::from);

        match fs::read(&path) {
            Ok(bytes) => {
                outcome.file_exists = true;
                outcome.content = String::from_utf8_lossy(&bytes).into_owned();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read configuration content");
                outcome.file_exists = true;
            }
        }
        outcome
    }

    /// The most recent error recorded for `target_name`.
    pub fn last_error(&self, target_name: &str) -> Option<String> {
        self.errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target_name)
            .cloned()
    }

    /// Remove the named entries under the root, best effort.
    ///
    /// Entries may be files or directories; missing ones are skipped. Every
    /// entry is attempted and all failures are reported together.
    pub fn reset<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut errors = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name == LOCK_FILE {
                continue;
            }
            match self.remove_entry(name) {
                Ok(()) => self.record(name, None),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Reset { errors })
        }
    }

    /// Remove everything under the root except the ownership lock.
    ///
    /// Also sweeps temporary files orphaned by an interrupted process.
    pub fn clean_all(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        tracing::info!(root = %self.root.display(), entries = names.len(), "cleaning configuration root");
        self.reset(names)
    }

    fn remove_entry(&self, name: &str) -> Result<()> {
        let path = if name.starts_with(RESERVED_PREFIX) {
            // Bookkeeping files bypass target-name rules but must stay local.
            if name.contains(['/', '\\']) {
                return Err(Error::InvalidTargetName {
                    name: name.to_string(),
                    reason: "must be a single path component",
                });
            }
            self.root.join(name)
        } else {
            resolve_target(&self.root, name)?
        };

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(&path, e)),
        };

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match removed {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    fn record(&self, target_name: &str, error: Option<&Error>) {
        let mut errors = self.errors.write().unwrap_or_else(PoisonError::into_inner);
        match error {
            Some(err) => {
                errors.insert(target_name.to_string(), err.to_string());
            }
            None => {
                errors.remove(target_name);
            }
        }
    }
}

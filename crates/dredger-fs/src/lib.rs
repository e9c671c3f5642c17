//! Filesystem layer for the configuration reconciler
//!
//! Provides the [`ConfigManager`], which owns a configuration root and
//! converges individual files inside it atomically, plus the supporting
//! atomic I/O, hashing and document-format helpers.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod manager;
pub mod path;

pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use manager::{ConfigManager, ConfigRequest, DEFAULT_PERMISSION, LOCK_FILE, SyncOutcome};
pub use path::resolve_target;

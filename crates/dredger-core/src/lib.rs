//! Reconciliation engine for node configuration files
//!
//! Drives a [`dredger_fs::ConfigManager`] from desired-state records:
//!
//! - **Validation** of record specs before any side effect ([`validate`])
//! - **Condition derivation** from file outcomes ([`derive_status`])
//! - **Reconciliation** with finalizer-protected cleanup ([`Reconciler`])
//! - **Object stores** for records and nodes ([`store`])
//! - **Node labels** mirroring content hashes ([`NodeLabelManager`])
//!
//! ```text
//!                 dredger-cli
//!                      |
//!                 dredger-core
//!                  /        \
//!          dredger-fs    dredger-api
//! ```

pub mod conditions;
pub mod error;
pub mod lifecycle;
pub mod nodelabel;
pub mod reconciler;
pub mod settings;
pub mod store;
pub mod validate;

pub use conditions::{derive_status, statuses_are_equal};
pub use error::{Error, Result};
pub use lifecycle::Lifecycle;
pub use nodelabel::{
    CONTENT_HASH_V1, LabelError, NodeClient, NodeLabelManager, content_hash_label, is_valid_key,
};
pub use reconciler::{DEFAULT_FINALIZER, ReconcileOutcome, Reconciler, request_from_spec};
pub use settings::Settings;
pub use store::{
    ConfigurationStore, FileStore, MemoryStore, StoreError, StoreResult, validate_key,
};
pub use validate::{ValidationError, validate};

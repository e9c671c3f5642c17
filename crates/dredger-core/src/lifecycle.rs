//! Lifecycle of a record as seen by one reconciliation pass

use dredger_api::Configuration;

/// Where a record stands, derived once per pass from its deletion timestamp
/// and finalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// The record no longer exists in the store
    Gone,
    /// The record is live; `finalized` tells whether our finalizer is on it
    Active {
        conf: Box<Configuration>,
        finalized: bool,
    },
    /// Deletion was requested; cleanup is owed only while `finalized`
    Deleting {
        conf: Box<Configuration>,
        finalized: bool,
    },
}

impl Lifecycle {
    pub fn classify(conf: Option<Configuration>, finalizer: &str) -> Self {
        let Some(conf) = conf else {
            return Self::Gone;
        };
        let finalized = conf.metadata.has_finalizer(finalizer);
        if conf.metadata.is_deleting() {
            Self::Deleting {
                conf: Box::new(conf),
                finalized,
            }
        } else {
            Self::Active {
                conf: Box::new(conf),
                finalized,
            }
        }
    }

    pub fn record(&self) -> Option<&Configuration> {
        match self {
            Self::Gone => None,
            Self::Active { conf, .. } | Self::Deleting { conf, .. } => Some(&**conf),
        }
    }
}

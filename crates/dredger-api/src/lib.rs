//! Record types exchanged with the control plane
//!
//! A [`Configuration`] declares one file that must exist on one node, with
//! given content and permissions. Its [`ConfigurationStatus`] reports what
//! the reconciler last observed, as three [`Condition`]s.

pub mod condition;
pub mod configuration;
pub mod meta;
pub mod node;

pub use condition::{Condition, ConditionReason, ConditionStatus, ConditionType, find_condition};
pub use configuration::{Configuration, ConfigurationSpec, ConfigurationStatus};
pub use meta::{ObjectKey, ObjectMeta};
pub use node::Node;

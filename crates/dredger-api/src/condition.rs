//! Status conditions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The health signal a condition reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// The file matches the desired state
    Available,
    /// The file is being brought to the desired state
    Progressing,
    /// The last attempt to write the file failed
    Degraded,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Progressing => "Progressing",
            Self::Degraded => "Degraded",
        }
    }
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-valued condition status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    #[default]
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Machine-readable reason attached to a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionReason {
    #[default]
    AsExpected,
    UpToDate,
    WriteError,
    UpdatingContent,
    UpdatingLabels,
}

impl ConditionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsExpected => "AsExpected",
            Self::UpToDate => "UpToDate",
            Self::WriteError => "WriteError",
            Self::UpdatingContent => "UpdatingContent",
            Self::UpdatingLabels => "UpdatingLabels",
        }
    }
}

impl std::fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named health signal with a reason and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    /// A `False`/`AsExpected` condition of the given type.
    pub fn new(type_: ConditionType, last_transition_time: Option<DateTime<Utc>>) -> Self {
        Self {
            type_,
            status: ConditionStatus::False,
            reason: ConditionReason::AsExpected,
            message: String::new(),
            last_transition_time,
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    /// Equal in everything but the transition time.
    pub fn same_observation(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Find the condition of type `type_`.
pub fn find_condition(conditions: &[Condition], type_: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

//! Derivation of the observed status from a synchronization outcome
//!
//! The full condition set is recomputed from scratch on every pass. There
//! is no per-condition transition history: all three conditions share the
//! outcome's last-updated timestamp as their transition time, so that
//! timestamp moves whenever the file is rewritten, not only when a
//! condition flips.

use dredger_api::{
    Condition, ConditionReason, ConditionStatus, ConditionType, ConfigurationSpec,
    ConfigurationStatus,
};
use dredger_fs::SyncOutcome;

/// Map a synchronization outcome onto the observed status.
///
/// Pure and deterministic. Produces exactly three conditions, always in
/// the order Degraded, Progressing, Available.
///
/// - Degraded is true when the last write failed.
/// - Progressing is true when the write failed while content still
///   differs from the desired content, or when updating node labels
///   failed. A content mismatch takes precedence in the reason.
/// - Available is true when nothing failed and the content matches.
pub fn derive_status(
    desired: &ConfigurationSpec,
    outcome: &SyncOutcome,
    label_error: Option<&dyn std::error::Error>,
) -> ConfigurationStatus {
    let ts = outcome.last_updated;
    let write_error = outcome
        .last_write_error
        .as_deref()
        .filter(|message| !message.is_empty());
    let content_matches = desired.content == outcome.content;

    let mut degraded = Condition::new(ConditionType::Degraded, ts);
    if let Some(message) = write_error {
        degraded.status = ConditionStatus::True;
        degraded.reason = ConditionReason::WriteError;
        degraded.message = message.to_string();
    }

    let mut progressing = Condition::new(ConditionType::Progressing, ts);
    match (write_error, label_error) {
        (Some(message), _) if !content_matches => {
            progressing.status = ConditionStatus::True;
            progressing.reason = ConditionReason::UpdatingContent;
            progressing.message = message.to_string();
        }
        (_, Some(err)) => {
            progressing.status = ConditionStatus::True;
            progressing.reason = ConditionReason::UpdatingLabels;
            progressing.message = err.to_string();
        }
        _ => {}
    }

    let mut available = Condition::new(ConditionType::Available, ts);
    if write_error.is_none() && content_matches && label_error.is_none() {
        available.status = ConditionStatus::True;
        available.reason = ConditionReason::UpToDate;
    }

    ConfigurationStatus {
        last_updated: ts,
        content: outcome.content.clone(),
        file_exists: outcome.file_exists,
        conditions: vec![degraded, progressing, available],
    }
}

/// Whether writing `new` over `old` would change anything an observer acts on.
///
/// Conditions compare by length and then pairwise, in order, on type,
/// status, reason and message. Timestamps are ignored so that rewriting an
/// unchanged file does not produce a status update on every pass.
pub fn statuses_are_equal(old: &ConfigurationStatus, new: &ConfigurationStatus) -> bool {
    old.content == new.content
        && old.file_exists == new.file_exists
        && old.conditions.len() == new.conditions.len()
        && old
            .conditions
            .iter()
            .zip(&new.conditions)
            .all(|(a, b)| a.same_observation(b))
}

//! Approval-routing policy.
//!
//! Pure functions with no storage access. The thresholds are fixed: changing
//! them changes accounting treatment and is a code change, not configuration.

use crate::enums::{EntryKind, EntryStatus};
use crate::errors::CoreError;

/// Manual entries at or under this many hours are confirmed without review.
pub const AUTO_APPROVE_THRESHOLD_HOURS: f64 = 4.0;

/// Relative change between estimate and confirmation above which a reason is required.
pub const ADJUSTMENT_REASON_THRESHOLD: f64 = 0.20;

pub const MAX_ENTRY_HOURS: f64 = 24.0;

pub const MIN_REJECTION_REASON_LEN: usize = 10;

pub const MAX_REASON_LEN: usize = 2_000;

pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Longest inclusive date range accepted by bulk confirmation.
pub const MAX_BULK_RANGE_DAYS: i64 = 92;

pub const MAX_BULK_REASSIGN_IDS: usize = 500;

/// Fixed reason recorded on every revision produced by a reassignment.
pub const REASSIGN_REASON: &str = "reassigned to enhancement project";

/// Status an entry lands in once its confirmed view is written.
///
/// Manual entries route on the amount alone; daily entries route on the
/// project's manager-approval flag.
#[must_use]
pub fn auto_approve_status(
    kind: EntryKind,
    amount: f64,
    project_requires_approval: bool,
) -> EntryStatus {
    match kind {
        EntryKind::Manual if amount <= AUTO_APPROVE_THRESHOLD_HOURS => EntryStatus::Confirmed,
        EntryKind::Manual => EntryStatus::PendingApproval,
        EntryKind::Daily if project_requires_approval => EntryStatus::PendingApproval,
        EntryKind::Daily => EntryStatus::Confirmed,
    }
}

/// Whether confirming `confirmed` hours against an `estimated` figure needs a reason.
///
/// With no usable estimate any difference needs a reason.
#[must_use]
pub fn needs_adjustment_reason(estimated: f64, confirmed: f64) -> bool {
    if estimated <= 0.0 {
        return (confirmed - estimated).abs() > f64::EPSILON;
    }
    (confirmed - estimated).abs() / estimated > ADJUSTMENT_REASON_THRESHOLD
}

/// Reject hours that are not finite or fall outside `(0, MAX_ENTRY_HOURS]`.
///
/// # Errors
///
/// Returns `CoreError::Validation` describing the bad value.
pub fn validate_hours(hours: f64) -> Result<(), CoreError> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_ENTRY_HOURS {
        return Err(CoreError::Validation(format!(
            "hours must be greater than 0 and at most {MAX_ENTRY_HOURS}, got {hours}"
        )));
    }
    Ok(())
}

/// Reject free text longer than `max` characters.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the field.
pub fn validate_text(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) if v.chars().count() > max => Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Rejections must explain themselves.
///
/// # Errors
///
/// Returns `CoreError::Validation` when the trimmed reason is too short or too long.
pub fn validate_rejection_reason(reason: &str) -> Result<(), CoreError> {
    if reason.trim().chars().count() < MIN_REJECTION_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "rejection reason must be at least {MIN_REJECTION_REASON_LEN} characters"
        )));
    }
    validate_text("rejection reason", Some(reason), MAX_REASON_LEN)
}

/// Treat whitespace-only text as absent.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

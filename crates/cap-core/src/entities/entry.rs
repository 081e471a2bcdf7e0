use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConfirmationMethod, EntryKind, EntryStatus, ProjectPhase};
use crate::period::Period;

/// A developer's time on one project for one day.
///
/// Carries two views: the suggested view written once at creation, and the
/// confirmed view written by the workflow engine. Daily entries start with an
/// empty confirmed view; manual entries are created with both populated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Entry {
    pub id: String,
    pub kind: EntryKind,
    pub developer_id: String,
    /// `None` when the estimation pipeline could not match a project.
    pub project_id: Option<String>,
    pub date: NaiveDate,

    // Suggested view
    pub estimated_hours: f64,
    pub phase_suggested: ProjectPhase,
    pub description_suggested: Option<String>,
    pub source_session_ids: Vec<String>,
    pub source_commit_ids: Vec<String>,
    /// Set when the estimation pipeline thinks the work belongs on an enhancement project.
    pub enhancement_suggested: bool,

    // Confirmed view
    pub hours_confirmed: Option<f64>,
    pub phase_confirmed: Option<ProjectPhase>,
    pub description_confirmed: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub confirmation_method: Option<ConfirmationMethod>,
    pub adjustment_reason: Option<String>,

    pub status: EntryStatus,

    // Review
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    #[must_use]
    pub fn period(&self) -> Period {
        Period::of(self.date)
    }

    /// Confirmed hours if set, otherwise the estimate.
    #[must_use]
    pub fn effective_hours(&self) -> f64 {
        self.hours_confirmed.unwrap_or(self.estimated_hours)
    }

    #[must_use]
    pub fn effective_phase(&self) -> ProjectPhase {
        self.phase_confirmed.unwrap_or(self.phase_suggested)
    }

    #[must_use]
    pub fn effective_description(&self) -> Option<&str> {
        self.description_confirmed
            .as_deref()
            .or(self.description_suggested.as_deref())
    }

    #[must_use]
    pub const fn is_confirmed_view_empty(&self) -> bool {
        self.hours_confirmed.is_none()
            && self.phase_confirmed.is_none()
            && self.description_confirmed.is_none()
    }
}

//! Entry update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cap_core::enums::{ConfirmationMethod, EntryStatus, ProjectPhase};

/// Columns of `entries` the workflow engine may rewrite.
///
/// The suggested view is immutable except for `phase_suggested` and
/// `enhancement_suggested`, which reassignment resets.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_suggested: Option<ProjectPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement_suggested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_confirmed: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_confirmed: Option<Option<ProjectPhase>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_confirmed: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_method: Option<Option<ConfirmationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment_reason: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<Option<String>>,
}

impl EntryUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Default)]
pub struct EntryUpdateBuilder(EntryUpdate);

impl EntryUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(EntryUpdate::default())
    }

    #[must_use]
    pub fn project_id(mut self, project_id: Option<String>) -> Self {
        self.0.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub fn phase_suggested(mut self, phase: ProjectPhase) -> Self {
        self.0.phase_suggested = Some(phase);
        self
    }

    #[must_use]
    pub fn enhancement_suggested(mut self, flag: bool) -> Self {
        self.0.enhancement_suggested = Some(flag);
        self
    }

    /// Write the confirmed view in one go.
    #[must_use]
    pub fn confirmation(
        mut self,
        hours: f64,
        phase: ProjectPhase,
        description: Option<String>,
        by: &str,
        method: ConfirmationMethod,
        at: DateTime<Utc>,
    ) -> Self {
        self.0.hours_confirmed = Some(Some(hours));
        self.0.phase_confirmed = Some(Some(phase));
        self.0.description_confirmed = Some(description);
        self.0.confirmed_by = Some(Some(by.to_string()));
        self.0.confirmation_method = Some(Some(method));
        self.0.confirmed_at = Some(Some(at));
        self
    }

    #[must_use]
    pub fn adjustment_reason(mut self, reason: Option<String>) -> Self {
        self.0.adjustment_reason = Some(reason);
        self
    }

    /// Null every column of the confirmed view.
    #[must_use]
    pub fn clear_confirmation(mut self) -> Self {
        self.0.hours_confirmed = Some(None);
        self.0.phase_confirmed = Some(None);
        self.0.description_confirmed = Some(None);
        self.0.confirmed_by = Some(None);
        self.0.confirmation_method = Some(None);
        self.0.confirmed_at = Some(None);
        self.0.adjustment_reason = Some(None);
        self
    }

    #[must_use]
    pub fn status(mut self, status: EntryStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    /// Stamp the reviewer; `rejection_reason` is `None` for approvals.
    #[must_use]
    pub fn review(
        mut self,
        by: &str,
        at: DateTime<Utc>,
        rejection_reason: Option<String>,
    ) -> Self {
        self.0.reviewed_by = Some(Some(by.to_string()));
        self.0.reviewed_at = Some(Some(at));
        self.0.rejection_reason = Some(rejection_reason);
        self
    }

    #[must_use]
    pub fn build(self) -> EntryUpdate {
        self.0
    }
}

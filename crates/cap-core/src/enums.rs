//! Status enums, entry kinds, phases, and actor roles for captrack.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `EntryStatus` carries the entry state machine; the workflow engine checks
//! `can_transition_to()` before every status write.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntryKind
// ---------------------------------------------------------------------------

/// Origin of a time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Suggested by the estimation pipeline from session and commit telemetry.
    Daily,
    /// Logged by hand.
    Manual,
}

impl EntryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntryStatus
// ---------------------------------------------------------------------------

/// Status of a time entry through confirmation and approval.
///
/// ```text
/// pending → confirmed
///         → pending_approval → approved
///                            → rejected
///                            → pending   (reassigned)
/// confirmed → pending_approval           (re-confirmed)
/// pending_approval → confirmed           (re-confirmed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    PendingApproval,
    Confirmed,
    Approved,
    Rejected,
}

impl EntryStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::PendingApproval],
            Self::Confirmed => &[Self::PendingApproval],
            Self::PendingApproval => &[
                Self::Confirmed,
                Self::Approved,
                Self::Rejected,
                Self::Pending,
            ],
            Self::Approved | Self::Rejected => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether `confirm` may (re)write the confirmed view.
    #[must_use]
    pub const fn accepts_confirmation(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::PendingApproval)
    }

    /// Whether the entry may be moved to another project.
    #[must_use]
    pub const fn accepts_reassignment(self) -> bool {
        matches!(self, Self::Pending | Self::PendingApproval)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingApproval => "pending_approval",
            Self::Confirmed => "confirmed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectPhase
// ---------------------------------------------------------------------------

/// Software-development phase driving capitalization treatment.
///
/// Only `application_development` time is capitalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    Preliminary,
    ApplicationDevelopment,
    PostImplementation,
}

impl ProjectPhase {
    #[must_use]
    pub const fn is_capitalizable(self) -> bool {
        matches!(self, Self::ApplicationDevelopment)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preliminary => "preliminary",
            Self::ApplicationDevelopment => "application_development",
            Self::PostImplementation => "post_implementation",
        }
    }
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfirmationMethod
// ---------------------------------------------------------------------------

/// How the confirmed view of an entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMethod {
    Single,
    Bulk,
    BulkRange,
    Email,
    Manual,
}

impl ConfirmationMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Bulk => "bulk",
            Self::BulkRange => "bulk_range",
            Self::Email => "email",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ConfirmationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuthMethod
// ---------------------------------------------------------------------------

/// How the actor behind a revision was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    WebSession,
    EmailReply,
    ApiToken,
}

impl AuthMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebSession => "web_session",
            Self::EmailReply => "email_reply",
            Self::ApiToken => "api_token",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of the requesting actor, as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    Manager,
    Admin,
}

impl Role {
    /// Managers and admins may act on entries owned by other developers.
    #[must_use]
    pub const fn can_act_for_others(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PeriodStatus
// ---------------------------------------------------------------------------

/// Lock status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    #[default]
    Open,
    Locked,
}

impl PeriodStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrackedField
// ---------------------------------------------------------------------------

/// Entry fields whose changes are recorded in the revision ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Status,
    HoursConfirmed,
    PhaseConfirmed,
    DescriptionConfirmed,
    ProjectId,
    PhaseSuggested,
    EnhancementSuggested,
}

impl TrackedField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::HoursConfirmed => "hours_confirmed",
            Self::PhaseConfirmed => "phase_confirmed",
            Self::DescriptionConfirmed => "description_confirmed",
            Self::ProjectId => "project_id",
            Self::PhaseSuggested => "phase_suggested",
            Self::EnhancementSuggested => "enhancement_suggested",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Single and bulk confirmation.

use chrono::Utc;

use cap_core::entities::{Entry, FieldChange};
use cap_core::enums::{AuthMethod, ConfirmationMethod, EntryStatus, ProjectPhase, TrackedField};
use cap_core::errors::CoreError;
use cap_core::identity::Actor;
use cap_core::policy::{
    ADJUSTMENT_REASON_THRESHOLD, auto_approve_status, needs_adjustment_reason, non_blank,
};
use cap_core::responses::{BulkConfirmResponse, SkippedEntry};
use cap_db::WriteTxn;
use cap_db::updates::entry::EntryUpdateBuilder;

use super::{
    ENTITY_ENTRY, WorkflowEngine, ensure_owner, invalid_transition, log_storage_failure,
};
use crate::error::{WorkflowError, skip_reason};
use crate::guard::PeriodLockGuard;
use crate::inputs::{BulkConfirmTarget, ConfirmFields};

/// Values about to be written to an entry's confirmed view.
struct Confirmation<'a> {
    hours: f64,
    phase: ProjectPhase,
    description: Option<String>,
    reason: Option<&'a str>,
    method: ConfirmationMethod,
}

impl WorkflowEngine {
    /// Confirm (or re-confirm) one entry.
    ///
    /// # Errors
    ///
    /// `Validation` for bad fields or a missing adjustment reason, `NotFound`,
    /// `Forbidden(NotOwner)`, `InvalidTransition` for reviewed entries,
    /// `PeriodLocked`.
    #[tracing::instrument(skip_all, fields(entry_id = %entry_id, actor = %actor.id))]
    pub async fn confirm(
        &self,
        entry_id: &str,
        fields: ConfirmFields,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        fields.validate()?;
        let method = match actor.auth_method {
            AuthMethod::EmailReply => ConfirmationMethod::Email,
            AuthMethod::WebSession | AuthMethod::ApiToken => ConfirmationMethod::Single,
        };

        let mut txn = self.begin_write().await?;
        let result = Self::confirm_in(&mut txn, entry_id, &fields, method, actor).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!(status = %entry.status, %method, "entry confirmed");
        Ok(entry)
    }

    async fn confirm_in(
        txn: &mut WriteTxn<'_>,
        entry_id: &str,
        fields: &ConfirmFields,
        method: ConfirmationMethod,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let entry = txn
            .entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_ENTRY, entry_id))?;
        ensure_owner(&entry, actor)?;
        if !entry.status.accepts_confirmation() {
            return Err(invalid_transition(&entry, EntryStatus::Confirmed).into());
        }
        PeriodLockGuard::new(&*txn).assert_open(entry.date).await?;

        let reason = fields.reason();
        if reason.is_none() && needs_adjustment_reason(entry.estimated_hours, fields.hours) {
            return Err(CoreError::Validation(format!(
                "adjustment_reason is required when confirmed hours differ from the estimate \
                 by more than {:.0}%",
                ADJUSTMENT_REASON_THRESHOLD * 100.0
            ))
            .into());
        }

        let confirmation = Confirmation {
            hours: fields.hours,
            phase: fields.phase.unwrap_or_else(|| entry.effective_phase()),
            description: non_blank(fields.description.as_deref())
                .or_else(|| entry.effective_description())
                .map(String::from),
            reason,
            method,
        };
        Self::apply_confirmation(txn, &entry, confirmation, actor).await
    }

    /// Accept the suggested view of every `pending` entry the actor owns in
    /// the targeted dates.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad range, `PeriodLocked` if any targeted period is
    /// locked (nothing is written). Per-entry failures are reported in `failed`.
    #[tracing::instrument(skip_all, fields(actor = %actor.id))]
    pub async fn bulk_confirm(
        &self,
        target: BulkConfirmTarget,
        actor: &Actor,
    ) -> Result<BulkConfirmResponse, WorkflowError> {
        let (start, end) = target.bounds()?;
        PeriodLockGuard::new(self.service())
            .assert_all_open(start.iter_days().take_while(|day| *day <= end))
            .await?;

        let candidates = self
            .service()
            .pending_entries_for(&actor.id, start, end)
            .await
            .map_err(WorkflowError::from)
            .inspect_err(log_storage_failure)?;

        let method = target.method();
        let mut response = BulkConfirmResponse::default();
        for candidate in candidates {
            match self.bulk_confirm_one(&candidate.id, method, actor).await {
                Ok(entry) => {
                    response.confirmed += 1;
                    *response.by_date.entry(entry.date).or_insert(0) += 1;
                }
                Err(err) => {
                    tracing::warn!(entry_id = %candidate.id, error = %err, "bulk confirm skipped entry");
                    response
                        .failed
                        .push(SkippedEntry::new(candidate.id, skip_reason(&err)));
                }
            }
        }
        tracing::info!(
            confirmed = response.confirmed,
            failed = response.failed.len(),
            "bulk confirm finished"
        );
        Ok(response)
    }

    async fn bulk_confirm_one(
        &self,
        entry_id: &str,
        method: ConfirmationMethod,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let mut txn = self.begin_write().await?;
        let result = Self::bulk_confirm_in(&mut txn, entry_id, method, actor).await;
        txn.finish(result).await.inspect_err(log_storage_failure)
    }

    async fn bulk_confirm_in(
        txn: &mut WriteTxn<'_>,
        entry_id: &str,
        method: ConfirmationMethod,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        // Re-read: the entry may have moved since candidates were selected.
        let entry = txn
            .entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_ENTRY, entry_id))?;
        ensure_owner(&entry, actor)?;
        if entry.status != EntryStatus::Pending {
            return Err(invalid_transition(&entry, EntryStatus::Confirmed).into());
        }
        PeriodLockGuard::new(&*txn).assert_open(entry.date).await?;

        let confirmation = Confirmation {
            hours: entry.estimated_hours,
            phase: entry.phase_suggested,
            description: entry.description_suggested.clone(),
            reason: None,
            method,
        };
        Self::apply_confirmation(txn, &entry, confirmation, actor).await
    }

    /// Route the status, write the confirmed view and append one revision per
    /// changed field.
    async fn apply_confirmation(
        txn: &mut WriteTxn<'_>,
        entry: &Entry,
        confirmation: Confirmation<'_>,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let requires_approval = match entry.project_id.as_deref() {
            Some(project_id) => txn
                .project(project_id)
                .await?
                .is_some_and(|p| p.requires_manager_approval),
            None => false,
        };
        let status = auto_approve_status(entry.kind, confirmation.hours, requires_approval);
        if status != entry.status && !entry.status.can_transition_to(status) {
            return Err(invalid_transition(entry, status).into());
        }

        let changes = [
            FieldChange::new(
                TrackedField::HoursConfirmed,
                Some(entry.effective_hours()),
                Some(confirmation.hours),
            ),
            FieldChange::new(
                TrackedField::PhaseConfirmed,
                Some(entry.effective_phase()),
                Some(confirmation.phase),
            ),
            FieldChange::new(
                TrackedField::DescriptionConfirmed,
                entry.effective_description(),
                confirmation.description.as_deref(),
            ),
            FieldChange::new(TrackedField::Status, Some(entry.status), Some(status)),
        ];

        let now = Utc::now();
        let update = EntryUpdateBuilder::new()
            .confirmation(
                confirmation.hours,
                confirmation.phase,
                confirmation.description,
                &actor.id,
                confirmation.method,
                now,
            )
            .adjustment_reason(confirmation.reason.map(String::from))
            .status(status)
            .build();
        let updated = txn.update_entry(&entry.id, &update, now).await?;
        txn.append_revisions(&updated, &changes, actor, confirmation.reason, now)
            .await?;
        Ok(updated)
    }
}

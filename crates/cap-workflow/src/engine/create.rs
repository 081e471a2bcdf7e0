//! Entry creation: suggestions from the estimation pipeline and manual logging.

use chrono::Utc;

use cap_core::entities::Entry;
use cap_core::enums::{ConfirmationMethod, EntryKind, EntryStatus};
use cap_core::errors::{CoreError, ForbiddenReason};
use cap_core::identity::Actor;
use cap_core::ids::PREFIX_ENTRY;
use cap_core::policy::{auto_approve_status, non_blank};
use cap_db::WriteTxn;

use super::{ENTITY_PROJECT, WorkflowEngine, ensure_admin, log_storage_failure};
use crate::error::WorkflowError;
use crate::guard::PeriodLockGuard;
use crate::inputs::{ManualEntryInput, SuggestionInput};

impl WorkflowEngine {
    /// Store a suggested daily entry in `pending`.
    ///
    /// Creation is the ledger's baseline, so no revision is written.
    ///
    /// # Errors
    ///
    /// `Validation`, `Forbidden(InsufficientRole)` unless admin, `NotFound`
    /// for an unknown project, `PeriodLocked`.
    #[tracing::instrument(skip_all, fields(developer_id = %input.developer_id, date = %input.date))]
    pub async fn ingest_suggestion(
        &self,
        input: SuggestionInput,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        input.validate()?;
        ensure_admin(actor)?;

        let txn = self.begin_write().await?;
        let result = Self::ingest_in(&txn, input).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!(entry_id = %entry.id, "suggestion ingested");
        Ok(entry)
    }

    async fn ingest_in(txn: &WriteTxn<'_>, input: SuggestionInput) -> Result<Entry, WorkflowError> {
        let project_id = non_blank(input.project_id.as_deref()).map(String::from);
        if let Some(ref id) = project_id {
            if txn.project(id).await?.is_none() {
                return Err(CoreError::not_found(ENTITY_PROJECT, id.as_str()).into());
            }
        }
        PeriodLockGuard::new(txn).assert_open(input.date).await?;

        let now = Utc::now();
        let entry = Entry {
            id: txn.generate_id(PREFIX_ENTRY).await?,
            kind: EntryKind::Daily,
            developer_id: input.developer_id.trim().to_string(),
            project_id,
            date: input.date,
            estimated_hours: input.estimated_hours,
            phase_suggested: input.phase_suggested,
            description_suggested: non_blank(input.description_suggested.as_deref())
                .map(String::from),
            source_session_ids: input.source_session_ids,
            source_commit_ids: input.source_commit_ids,
            enhancement_suggested: input.enhancement_suggested,
            hours_confirmed: None,
            phase_confirmed: None,
            description_confirmed: None,
            confirmed_at: None,
            confirmed_by: None,
            confirmation_method: None,
            adjustment_reason: None,
            status: EntryStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        txn.insert_entry(&entry).await?;
        Ok(entry)
    }

    /// Log time by hand. Both views are populated from the input and the
    /// status is routed on the amount.
    ///
    /// # Errors
    ///
    /// `Validation`, `Forbidden(NotOwner)` when a developer logs for someone
    /// else, `NotFound` for an unknown project, `PeriodLocked`.
    #[tracing::instrument(skip_all, fields(actor = %actor.id, date = %input.date))]
    pub async fn log_manual_entry(
        &self,
        input: ManualEntryInput,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        input.validate()?;
        let developer_id = non_blank(input.developer_id.as_deref())
            .map_or_else(|| actor.id.clone(), String::from);
        if !actor.may_act_for(&developer_id) {
            return Err(CoreError::Forbidden(ForbiddenReason::NotOwner).into());
        }

        let txn = self.begin_write().await?;
        let result = Self::manual_in(&txn, input, developer_id, actor).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!(entry_id = %entry.id, status = %entry.status, "manual entry logged");
        Ok(entry)
    }

    async fn manual_in(
        txn: &WriteTxn<'_>,
        input: ManualEntryInput,
        developer_id: String,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let project_id = input.project_id.trim();
        let project = txn
            .project(project_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_PROJECT, project_id))?;
        PeriodLockGuard::new(txn).assert_open(input.date).await?;

        let now = Utc::now();
        let phase = input.phase.unwrap_or(project.phase);
        let description = non_blank(input.description.as_deref()).map(String::from);
        let status = auto_approve_status(
            EntryKind::Manual,
            input.hours,
            project.requires_manager_approval,
        );
        let entry = Entry {
            id: txn.generate_id(PREFIX_ENTRY).await?,
            kind: EntryKind::Manual,
            developer_id,
            project_id: Some(project.id),
            date: input.date,
            estimated_hours: input.hours,
            phase_suggested: phase,
            description_suggested: description.clone(),
            source_session_ids: Vec::new(),
            source_commit_ids: Vec::new(),
            enhancement_suggested: false,
            hours_confirmed: Some(input.hours),
            phase_confirmed: Some(phase),
            description_confirmed: description,
            confirmed_at: Some(now),
            confirmed_by: Some(actor.id.clone()),
            confirmation_method: Some(ConfirmationMethod::Manual),
            adjustment_reason: None,
            status,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        txn.insert_entry(&entry).await?;
        Ok(entry)
    }
}

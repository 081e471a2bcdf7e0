//! Reassignment of time to an enhancement project.
//!
//! Moving an entry resets it to `pending` with an empty confirmed view, so
//! the developer confirms it again against the new project.

use chrono::Utc;

use cap_core::entities::{Entry, FieldChange, Project};
use cap_core::enums::{EntryStatus, ProjectPhase, TrackedField};
use cap_core::errors::CoreError;
use cap_core::identity::Actor;
use cap_core::policy::{REASSIGN_REASON, non_blank};
use cap_core::responses::{BulkReassignResponse, SkippedEntry};
use cap_db::WriteTxn;
use cap_db::updates::entry::EntryUpdateBuilder;

use super::{
    ENTITY_ENTRY, ENTITY_PROJECT, WorkflowEngine, ensure_owner, invalid_transition,
    log_storage_failure,
};
use crate::error::{WorkflowError, skip_reason};
use crate::guard::PeriodLockGuard;
use crate::inputs::validate_entry_ids;

const NOT_A_CHILD_PROJECT: &str = "Not a valid child project";

fn required_project_id(project_id: &str) -> Result<&str, CoreError> {
    non_blank(Some(project_id))
        .ok_or_else(|| CoreError::Validation("project_id is required".into()))
}

impl WorkflowEngine {
    /// Move one entry onto an enhancement of its current project.
    ///
    /// # Errors
    ///
    /// `NotFound` for the entry or the target project, `Forbidden(NotOwner)`,
    /// `InvalidTransition` unless `pending` or `pending_approval`,
    /// `PeriodLocked`, `Validation` when the target is not an
    /// application-development child of the entry's project.
    #[tracing::instrument(skip_all, fields(entry_id = %entry_id, actor = %actor.id))]
    pub async fn reassign(
        &self,
        entry_id: &str,
        project_id: &str,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let project_id = required_project_id(project_id)?;

        let mut txn = self.begin_write().await?;
        let result = Self::reassign_in(&mut txn, entry_id, project_id, actor).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!(project_id, "entry reassigned");
        Ok(entry)
    }

    async fn reassign_in(
        txn: &mut WriteTxn<'_>,
        entry_id: &str,
        project_id: &str,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let entry = txn
            .entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_ENTRY, entry_id))?;
        let target = txn
            .project(project_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_PROJECT, project_id))?;
        Self::reassign_loaded(txn, entry, &target, actor).await
    }

    /// Reassign a batch of entries. Each entry is checked and committed on
    /// its own; failures land in `skipped`.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad id list or a target outside application
    /// development, `NotFound` for the target project.
    #[tracing::instrument(skip_all, fields(actor = %actor.id, project_id = %project_id))]
    pub async fn bulk_reassign(
        &self,
        entry_ids: &[String],
        project_id: &str,
        actor: &Actor,
    ) -> Result<BulkReassignResponse, WorkflowError> {
        let ids = validate_entry_ids(entry_ids)?;
        let project_id = required_project_id(project_id)?;
        let target = self
            .service()
            .find_project(project_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_PROJECT, project_id))?;
        if target.phase != ProjectPhase::ApplicationDevelopment {
            return Err(CoreError::Validation(format!(
                "target project must be in {}, got {}",
                ProjectPhase::ApplicationDevelopment,
                target.phase
            ))
            .into());
        }

        let mut response = BulkReassignResponse::default();
        for id in ids {
            match self.reassign_one(&id, &target, actor).await {
                Ok(_) => response.reassigned.push(id),
                Err(err) => {
                    tracing::warn!(entry_id = %id, error = %err, "bulk reassign skipped entry");
                    response.skipped.push(SkippedEntry::new(id, skip_reason(&err)));
                }
            }
        }
        response.reassigned_count = u32::try_from(response.reassigned.len()).unwrap_or(u32::MAX);
        response.skipped_count = u32::try_from(response.skipped.len()).unwrap_or(u32::MAX);
        tracing::info!(
            reassigned = response.reassigned_count,
            skipped = response.skipped_count,
            "bulk reassign finished"
        );
        Ok(response)
    }

    async fn reassign_one(
        &self,
        entry_id: &str,
        target: &Project,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        let mut txn = self.begin_write().await?;
        let result = match txn.entry(entry_id).await {
            Ok(Some(entry)) => Self::reassign_loaded(&mut txn, entry, target, actor).await,
            Ok(None) => Err(CoreError::not_found(ENTITY_ENTRY, entry_id).into()),
            Err(e) => Err(e.into()),
        };
        txn.finish(result).await.inspect_err(log_storage_failure)
    }

    async fn reassign_loaded(
        txn: &mut WriteTxn<'_>,
        entry: Entry,
        target: &Project,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        ensure_owner(&entry, actor)?;
        if !entry.status.accepts_reassignment() {
            return Err(invalid_transition(&entry, EntryStatus::Pending).into());
        }
        PeriodLockGuard::new(&*txn).assert_open(entry.date).await?;
        if !target.is_enhancement_of(entry.project_id.as_deref())
            || target.phase != ProjectPhase::ApplicationDevelopment
        {
            return Err(CoreError::Validation(NOT_A_CHILD_PROJECT.to_string()).into());
        }

        let changes = [
            FieldChange::new(
                TrackedField::ProjectId,
                entry.project_id.as_deref(),
                Some(target.id.as_str()),
            ),
            FieldChange::new(
                TrackedField::PhaseSuggested,
                Some(entry.phase_suggested),
                Some(ProjectPhase::ApplicationDevelopment),
            ),
            FieldChange::new(
                TrackedField::EnhancementSuggested,
                Some(entry.enhancement_suggested),
                Some(false),
            ),
            FieldChange::new(TrackedField::HoursConfirmed, entry.hours_confirmed, None::<f64>),
            FieldChange::new(TrackedField::PhaseConfirmed, entry.phase_confirmed, None::<ProjectPhase>),
            FieldChange::new(
                TrackedField::DescriptionConfirmed,
                entry.description_confirmed.as_deref(),
                None::<&str>,
            ),
            FieldChange::new(
                TrackedField::Status,
                Some(entry.status),
                Some(EntryStatus::Pending),
            ),
        ];

        let now = Utc::now();
        let update = EntryUpdateBuilder::new()
            .project_id(Some(target.id.clone()))
            .phase_suggested(ProjectPhase::ApplicationDevelopment)
            .enhancement_suggested(false)
            .clear_confirmation()
            .status(EntryStatus::Pending)
            .build();
        let updated = txn.update_entry(&entry.id, &update, now).await?;
        txn.append_revisions(&updated, &changes, actor, Some(REASSIGN_REASON), now)
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use cap_core::enums::Role;
    use cap_core::errors::ForbiddenReason;
    use cap_db::NewProject;

    use super::*;
    use crate::inputs::ConfirmFields;
    use crate::test_support::{Fixture, dev, jan, manager};

    #[tokio::test]
    async fn reassign_resets_entry_to_pending() {
        let fx = Fixture::new().await;
        let mut input = fx.suggestion_input("dev-1", Some(&fx.parent.id), jan(9), 5.0);
        input.enhancement_suggested = true;
        let entry = fx
            .engine
            .ingest_suggestion(input, &crate::test_support::admin())
            .await
            .unwrap();

        let moved = fx
            .engine
            .reassign(&entry.id, &fx.child.id, &dev("dev-1"))
            .await
            .unwrap();
        assert_eq!(moved.project_id.as_deref(), Some(fx.child.id.as_str()));
        assert_eq!(moved.status, EntryStatus::Pending);
        assert!(!moved.enhancement_suggested);
        assert!(moved.is_confirmed_view_empty());

        let revisions = fx.engine.service().list_revisions(&entry.id).await.unwrap();
        let fields: Vec<TrackedField> = revisions.iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![TrackedField::ProjectId, TrackedField::EnhancementSuggested]
        );
        assert!(revisions.iter().all(|r| r.reason.as_deref() == Some(REASSIGN_REASON)));
    }

    #[tokio::test]
    async fn reassign_from_pending_approval_clears_confirmation() {
        let fx = Fixture::new().await;
        let gated_child = fx
            .engine
            .service()
            .create_project(
                NewProject::new("Ledger migration v2", ProjectPhase::ApplicationDevelopment)
                    .enhancing(&fx.gated.id),
            )
            .await
            .unwrap();
        let entry = fx.suggest("dev-1", &fx.gated.id, jan(9), 3.0).await;
        fx.engine
            .confirm(&entry.id, ConfirmFields::hours(3.5), &dev("dev-1"))
            .await
            .unwrap();

        let moved = fx
            .engine
            .reassign(&entry.id, &gated_child.id, &manager("mgr-1"))
            .await
            .unwrap();
        assert_eq!(moved.status, EntryStatus::Pending);
        assert_eq!(moved.hours_confirmed, None);
        assert_eq!(moved.confirmation_method, None);

        let revisions = fx.engine.service().list_revisions(&entry.id).await.unwrap();
        let numbers: Vec<i64> = revisions.iter().map(|r| r.revision_number).collect();
        assert_eq!(numbers, (1..=numbers.len() as i64).collect::<Vec<_>>());
        let status = revisions.last().unwrap();
        assert_eq!(status.field, TrackedField::Status);
        assert_eq!(status.old_value.as_deref(), Some("pending_approval"));
        assert_eq!(status.new_value.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn reassign_rejects_non_child_targets() {
        let fx = Fixture::new().await;
        let entry = fx.suggest("dev-1", &fx.parent.id, jan(9), 2.0).await;

        let err = fx
            .engine
            .reassign(&entry.id, &fx.gated.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Not a valid child project");

        let preliminary_child = fx
            .engine
            .service()
            .create_project(
                NewProject::new("Exports research", ProjectPhase::Preliminary)
                    .enhancing(&fx.parent.id),
            )
            .await
            .unwrap();
        let err = fx
            .engine
            .reassign(&entry.id, &preliminary_child.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(CoreError::Validation(_))));

        let err = fx
            .engine
            .reassign(&entry.id, "prj-missing", &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Rejected(CoreError::NotFound { ref entity_type, .. }) if entity_type == "project"
        ));
    }

    #[tokio::test]
    async fn confirmed_entries_cannot_be_reassigned() {
        let fx = Fixture::new().await;
        let entry = fx.suggest("dev-1", &fx.parent.id, jan(9), 2.0).await;
        fx.engine
            .confirm(&entry.id, ConfirmFields::hours(2.0), &dev("dev-1"))
            .await
            .unwrap();
        let err = fx
            .engine
            .reassign(&entry.id, &fx.child.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Rejected(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn locked_period_blocks_reassign() {
        let fx = Fixture::new().await;
        let entry = fx.suggest("dev-1", &fx.parent.id, jan(9), 2.0).await;
        fx.lock(jan(9)).await;
        let err = fx
            .engine
            .reassign(&entry.id, &fx.child.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(CoreError::PeriodLocked { .. })));
        let stored = fx.engine.service().find_entry(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.project_id.as_deref(), Some(fx.parent.id.as_str()));
        assert!(fx.engine.service().list_revisions(&entry.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_reassign_reports_each_skip() {
        let fx = Fixture::new().await;
        let others = fx.suggest("dev-2", &fx.parent.id, jan(12), 2.0).await;
        let confirmed = fx.suggest("dev-1", &fx.parent.id, jan(12), 2.0).await;
        fx.engine
            .confirm(&confirmed.id, ConfirmFields::hours(2.0), &dev("dev-1"))
            .await
            .unwrap();
        let valid = fx.suggest("dev-1", &fx.parent.id, jan(12), 3.0).await;

        let ids = vec![
            others.id.clone(),
            confirmed.id.clone(),
            valid.id.clone(),
            "ent-missing".to_string(),
        ];
        let response = fx
            .engine
            .bulk_reassign(&ids, &fx.child.id, &dev("dev-1"))
            .await
            .unwrap();

        assert_eq!(response.reassigned, vec![valid.id]);
        assert_eq!(
            response.skipped,
            vec![
                SkippedEntry::new(others.id, "Not your entry"),
                SkippedEntry::new(confirmed.id, "Entry is confirmed"),
                SkippedEntry::new("ent-missing", "Entry not found"),
            ]
        );
        assert_eq!(response.reassigned_count, 1);
        assert_eq!(response.skipped_count, 3);
    }

    #[tokio::test]
    async fn bulk_reassign_skips_locked_and_unrelated() {
        let fx = Fixture::new().await;
        let locked = fx.suggest("dev-1", &fx.parent.id, jan(12), 2.0).await;
        fx.lock(jan(12)).await;
        let december = chrono::NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        let unrelated = fx.suggest("dev-1", &fx.gated.id, december, 2.0).await;

        let ids = vec![locked.id.clone(), unrelated.id.clone()];
        let response = fx
            .engine
            .bulk_reassign(&ids, &fx.child.id, &Actor::new("mgr-1", Role::Manager))
            .await
            .unwrap();
        assert!(response.reassigned.is_empty());
        assert_eq!(
            response.skipped,
            vec![
                SkippedEntry::new(locked.id, "Period 2026-01 is locked"),
                SkippedEntry::new(unrelated.id, NOT_A_CHILD_PROJECT),
            ]
        );
    }

    #[tokio::test]
    async fn bulk_reassign_validates_request() {
        let fx = Fixture::new().await;
        let err = fx
            .engine
            .bulk_reassign(&[], &fx.child.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(CoreError::Validation(_))));

        let ids = vec!["ent-1".to_string()];
        let err = fx
            .engine
            .bulk_reassign(&ids, "prj-missing", &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(CoreError::NotFound { .. })));

        let research = fx
            .engine
            .service()
            .create_project(NewProject::new("Research", ProjectPhase::Preliminary))
            .await
            .unwrap();
        let err = fx
            .engine
            .bulk_reassign(&ids, &research.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn developers_cannot_reassign_others_entries() {
        let fx = Fixture::new().await;
        let entry = fx.suggest("dev-2", &fx.parent.id, jan(9), 2.0).await;
        let err = fx
            .engine
            .reassign(&entry.id, &fx.child.id, &dev("dev-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Rejected(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));
    }
}

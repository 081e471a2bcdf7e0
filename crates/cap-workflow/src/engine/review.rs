//! Manager review: approve and reject.

use chrono::Utc;

use cap_core::entities::{Entry, FieldChange};
use cap_core::enums::{EntryStatus, TrackedField};
use cap_core::errors::{CoreError, ForbiddenReason};
use cap_core::identity::Actor;
use cap_core::policy::validate_rejection_reason;
use cap_db::WriteTxn;
use cap_db::updates::entry::EntryUpdateBuilder;

use super::{
    ENTITY_ENTRY, WorkflowEngine, ensure_reviewer, invalid_transition, log_storage_failure,
};
use crate::error::WorkflowError;
use crate::guard::PeriodLockGuard;

impl WorkflowEngine {
    /// Approve an entry waiting for review.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden(SelfApproval)` for the entry's own developer,
    /// `Forbidden(InsufficientRole)`, `InvalidTransition` unless
    /// `pending_approval`, `PeriodLocked`.
    #[tracing::instrument(skip_all, fields(entry_id = %entry_id, actor = %actor.id))]
    pub async fn approve(&self, entry_id: &str, actor: &Actor) -> Result<Entry, WorkflowError> {
        let mut txn = self.begin_write().await?;
        let result = Self::review_in(&mut txn, entry_id, actor, None).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!("entry approved");
        Ok(entry)
    }

    /// Reject an entry waiting for review. The trimmed reason is stored on
    /// the entry and on its status revision.
    ///
    /// # Errors
    ///
    /// `Validation` for a short reason, then the same guards as [`Self::approve`].
    #[tracing::instrument(skip_all, fields(entry_id = %entry_id, actor = %actor.id))]
    pub async fn reject(
        &self,
        entry_id: &str,
        reason: &str,
        actor: &Actor,
    ) -> Result<Entry, WorkflowError> {
        validate_rejection_reason(reason)?;

        let mut txn = self.begin_write().await?;
        let result = Self::review_in(&mut txn, entry_id, actor, Some(reason.trim())).await;
        let entry = txn.finish(result).await.inspect_err(log_storage_failure)?;
        tracing::info!("entry rejected");
        Ok(entry)
    }

    async fn review_in(
        txn: &mut WriteTxn<'_>,
        entry_id: &str,
        actor: &Actor,
        rejection_reason: Option<&str>,
    ) -> Result<Entry, WorkflowError> {
        let entry = txn
            .entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_ENTRY, entry_id))?;
        if entry.developer_id == actor.id {
            return Err(CoreError::Forbidden(ForbiddenReason::SelfApproval).into());
        }
        ensure_reviewer(actor)?;

        let to = if rejection_reason.is_some() {
            EntryStatus::Rejected
        } else {
            EntryStatus::Approved
        };
        if entry.status != EntryStatus::PendingApproval {
            return Err(invalid_transition(&entry, to).into());
        }
        PeriodLockGuard::new(&*txn).assert_open(entry.date).await?;

        let now = Utc::now();
        let update = EntryUpdateBuilder::new()
            .status(to)
            .review(&actor.id, now, rejection_reason.map(String::from))
            .build();
        let updated = txn.update_entry(&entry.id, &update, now).await?;
        let change = FieldChange::new(TrackedField::Status, Some(entry.status), Some(to));
        txn.append_revisions(&updated, &[change], actor, rejection_reason, now)
            .await?;
        Ok(updated)
    }
}

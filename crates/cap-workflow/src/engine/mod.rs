//! The workflow engine: every mutation of an entry goes through here.
//!
//! Each single-entry operation runs in one write transaction: guards, the
//! entry write and its revision records commit together or not at all. Bulk
//! operations check period locks for all affected dates first, then commit
//! each entry in its own transaction and report per-item failures.

mod confirm;
mod create;
mod reassign;
mod review;

use cap_core::entities::{Entry, PeriodLock, RevisionRecord};
use cap_core::enums::{EntryStatus, Role};
use cap_core::errors::{CoreError, ForbiddenReason};
use cap_core::identity::Actor;
use cap_core::period::Period;
use cap_db::{CapService, EntryFilter, Page, WriteTxn};

use crate::error::WorkflowError;

pub(crate) const ENTITY_ENTRY: &str = "entry";
pub(crate) const ENTITY_PROJECT: &str = "project";

pub struct WorkflowEngine {
    service: CapService,
}

impl WorkflowEngine {
    #[must_use]
    pub const fn new(service: CapService) -> Self {
        Self { service }
    }

    #[must_use]
    pub const fn service(&self) -> &CapService {
        &self.service
    }

    /// Fetch an entry the actor may see.
    ///
    /// # Errors
    ///
    /// `NotFound` if missing, `Forbidden(NotOwner)` if owned by another
    /// developer and the actor is not a manager or admin.
    pub async fn get_entry(&self, entry_id: &str, actor: &Actor) -> Result<Entry, WorkflowError> {
        let entry = self
            .service
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY_ENTRY, entry_id))?;
        ensure_owner(&entry, actor)?;
        Ok(entry)
    }

    /// List entries. Developers only ever see their own.
    ///
    /// # Errors
    ///
    /// `Validation` for an inverted date range.
    pub async fn list_entries(
        &self,
        mut filter: EntryFilter,
        actor: &Actor,
    ) -> Result<Vec<Entry>, WorkflowError> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(CoreError::Validation(format!(
                    "date_from {from} is after date_to {to}"
                ))
                .into());
            }
        }
        if !actor.role.can_act_for_others() {
            filter.developer_id = Some(actor.id.clone());
        }
        Ok(self.service.list_entries(&filter).await?)
    }

    /// The entry's revision ledger, oldest first.
    ///
    /// # Errors
    ///
    /// Same visibility rules as [`Self::get_entry`].
    pub async fn list_revisions(
        &self,
        entry_id: &str,
        actor: &Actor,
    ) -> Result<Vec<RevisionRecord>, WorkflowError> {
        let entry = self.get_entry(entry_id, actor).await?;
        Ok(self.service.list_revisions(&entry.id).await?)
    }

    /// One page of entries waiting for a reviewer.
    ///
    /// # Errors
    ///
    /// `Forbidden(InsufficientRole)` for developers.
    pub async fn list_pending_approvals(
        &self,
        page: Page,
        actor: &Actor,
    ) -> Result<Vec<Entry>, WorkflowError> {
        ensure_reviewer(actor)?;
        let filter = EntryFilter {
            status: Some(EntryStatus::PendingApproval),
            ..EntryFilter::from(page)
        };
        Ok(self.service.list_entries(&filter).await?)
    }

    /// Open a write transaction, logging a failure in the caller's span.
    async fn begin_write(&self) -> Result<WriteTxn<'_>, WorkflowError> {
        self.service
            .begin_write()
            .await
            .map_err(WorkflowError::from)
            .inspect_err(log_storage_failure)
    }

    /// Lock state of an accounting period.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_period(&self, period: Period) -> Result<PeriodLock, WorkflowError> {
        Ok(self.service.period_lock(period).await?)
    }
}

pub(crate) fn ensure_owner(entry: &Entry, actor: &Actor) -> Result<(), CoreError> {
    if actor.may_act_for(&entry.developer_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
    }
}

pub(crate) const fn ensure_reviewer(actor: &Actor) -> Result<(), CoreError> {
    if actor.role.can_review() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(ForbiddenReason::InsufficientRole))
    }
}

pub(crate) fn ensure_admin(actor: &Actor) -> Result<(), CoreError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(CoreError::Forbidden(ForbiddenReason::InsufficientRole))
    }
}

pub(crate) fn invalid_transition(entry: &Entry, to: EntryStatus) -> CoreError {
    CoreError::InvalidTransition {
        entity_type: ENTITY_ENTRY.to_string(),
        id: entry.id.clone(),
        from: entry.status.to_string(),
        to: to.to_string(),
    }
}

/// Log storage failures with the operation's span (entry id, operation).
pub(crate) fn log_storage_failure(err: &WorkflowError) {
    if let WorkflowError::Database(db) = err {
        tracing::error!(error = %db, "storage failure");
    }
}

//! Write transactions.
//!
//! A `WriteTxn` holds the service's exclusive gate and an open `BEGIN
//! IMMEDIATE` transaction. Entry writes, revision appends and the JSONL trail
//! for one logical mutation all land in the same transaction: the trail lines
//! are buffered and flushed just before `COMMIT`. If the flush or the commit
//! fails, the trail files are cut back to their lengths before the flush.

use chrono::{DateTime, Utc};
use tokio::sync::RwLockWriteGuard;

use cap_core::entities::{Entry, FieldChange, PeriodLock, Project, RevisionRecord};
use cap_core::identity::Actor;
use cap_core::period::Period;

use crate::error::DatabaseError;
use crate::repos::{entries, period_locks, projects, revisions};
use crate::retry::RetryConfig;
use crate::trail::writer::{TrailMark, TrailWriter};
use crate::updates::entry::EntryUpdate;

pub struct WriteTxn<'a> {
    _gate: RwLockWriteGuard<'a, ()>,
    tx: libsql::Transaction,
    trail: &'a TrailWriter,
    retry: &'a RetryConfig,
    pending_trail: Vec<(Period, Vec<RevisionRecord>)>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(
        gate: RwLockWriteGuard<'a, ()>,
        tx: libsql::Transaction,
        trail: &'a TrailWriter,
        retry: &'a RetryConfig,
    ) -> Self {
        Self {
            _gate: gate,
            tx,
            trail,
            retry,
            pending_trail: Vec::new(),
        }
    }

    fn conn(&self) -> &libsql::Connection {
        &self.tx
    }

    /// Generate a prefixed ID inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        crate::generate_id(self.conn(), prefix).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn entry(&self, id: &str) -> Result<Option<Entry>, DatabaseError> {
        entries::fetch_entry(self.conn(), id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        projects::fetch_project(self.conn(), id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn period_lock(&self, period: Period) -> Result<PeriodLock, DatabaseError> {
        period_locks::fetch_period_lock(self.conn(), period).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn insert_entry(&self, entry: &Entry) -> Result<(), DatabaseError> {
        entries::insert_entry(self.conn(), entry).await
    }

    /// Apply `update` and return the stored entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails or the entry vanished.
    pub async fn update_entry(
        &self,
        id: &str,
        update: &EntryUpdate,
        now: DateTime<Utc>,
    ) -> Result<Entry, DatabaseError> {
        entries::update_entry(self.conn(), id, update, now).await
    }

    /// Append ledger records for every non-noop change to `entry` and queue
    /// them for the trail.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if an insert fails after retries.
    pub async fn append_revisions(
        &mut self,
        entry: &Entry,
        changes: &[FieldChange],
        actor: &Actor,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RevisionRecord>, DatabaseError> {
        let records = revisions::append_revisions(
            self.conn(),
            self.retry,
            &entry.id,
            changes,
            actor,
            reason,
            now,
        )
        .await?;
        if !records.is_empty() {
            self.pending_trail.push((entry.period(), records.clone()));
        }
        Ok(records)
    }

    /// Flush queued trail lines, then commit. A trail failure rolls back, and
    /// a failed flush or commit leaves the trail files as they were.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the trail write or the commit fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        let Self {
            _gate: gate,
            tx,
            trail,
            pending_trail,
            ..
        } = self;
        let mark = trail.mark(pending_trail.iter().map(|(period, _)| *period));
        for (period, records) in &pending_trail {
            if let Err(e) = trail.append(*period, records) {
                tracing::error!(%period, error = %e, "trail write failed, rolling back");
                restore_trail(trail, &mark);
                tx.rollback().await?;
                return Err(e);
            }
        }
        if let Err(e) = tx.commit().await {
            tracing::error!(error = %e, "commit failed, trimming trail");
            restore_trail(trail, &mark);
            return Err(e.into());
        }
        drop(gate);
        Ok(())
    }

    /// Discard every write made in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`, and hand `result` back.
    ///
    /// # Errors
    ///
    /// Returns the original error, or a `DatabaseError` from commit/rollback.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

fn restore_trail(trail: &TrailWriter, mark: &TrailMark) {
    if let Err(e) = trail.restore(mark) {
        tracing::error!(error = %e, "trail restore failed");
    }
}

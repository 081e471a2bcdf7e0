//! Period lock guard.
//!
//! Resolves each date to its accounting period and refuses any write that
//! would touch a locked one. Multi-date callers check every distinct period
//! before their first write.

use std::future::Future;

use chrono::NaiveDate;

use cap_core::entities::PeriodLock;
use cap_core::errors::CoreError;
use cap_core::period::{Period, distinct_periods};
use cap_db::error::DatabaseError;
use cap_db::{CapService, WriteTxn};

use crate::error::WorkflowError;

/// Anything that can report the lock state of a period.
pub trait PeriodLockSource {
    fn lock_for(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<PeriodLock, DatabaseError>> + Send;
}

impl PeriodLockSource for CapService {
    fn lock_for(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<PeriodLock, DatabaseError>> + Send {
        self.period_lock(period)
    }
}

impl PeriodLockSource for WriteTxn<'_> {
    fn lock_for(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<PeriodLock, DatabaseError>> + Send {
        self.period_lock(period)
    }
}

pub struct PeriodLockGuard<'a, S> {
    source: &'a S,
}

impl<'a, S: PeriodLockSource + Sync> PeriodLockGuard<'a, S> {
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fail with `PeriodLocked` if `date` falls in a locked period.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Rejected(CoreError::PeriodLocked)` or a storage error.
    pub async fn assert_open(&self, date: NaiveDate) -> Result<(), WorkflowError> {
        self.assert_period_open(Period::of(date)).await
    }

    /// Check every distinct period touched by `dates`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns the first `PeriodLocked` rejection, or a storage error.
    pub async fn assert_all_open<I>(&self, dates: I) -> Result<(), WorkflowError>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        for period in distinct_periods(dates) {
            self.assert_period_open(period).await?;
        }
        Ok(())
    }

    async fn assert_period_open(&self, period: Period) -> Result<(), WorkflowError> {
        let lock = self.source.lock_for(period).await?;
        if lock.is_locked() {
            tracing::debug!(%period, "write refused: period locked");
            return Err(CoreError::PeriodLocked { period }.into());
        }
        Ok(())
    }
}

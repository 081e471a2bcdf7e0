//! Period lock repository. A period without a row is open.

use chrono::Utc;

use cap_core::entities::PeriodLock;
use cap_core::enums::PeriodStatus;
use cap_core::period::Period;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_enum, parse_optional_datetime};
use crate::service::CapService;

pub(crate) async fn fetch_period_lock(
    conn: &libsql::Connection,
    period: Period,
) -> Result<PeriodLock, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT status, locked_by, locked_at FROM period_locks WHERE year = ?1 AND month = ?2",
            libsql::params![i64::from(period.year), i64::from(period.month)],
        )
        .await?;
    let Some(row) = rows.next().await? else {
        return Ok(PeriodLock::open(period));
    };
    Ok(PeriodLock {
        period,
        status: parse_enum(&row.get::<String>(0)?)?,
        locked_by: get_opt_string(&row, 1)?,
        locked_at: parse_optional_datetime(get_opt_string(&row, 2)?.as_deref())?,
    })
}

impl CapService {
    /// Current lock state of `period`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn period_lock(&self, period: Period) -> Result<PeriodLock, DatabaseError> {
        let _read = self.read_gate().await;
        fetch_period_lock(self.db().conn(), period).await
    }

    /// Lock or reopen a period. Administrative path, not exposed over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the upsert fails.
    pub async fn set_period_status(
        &self,
        period: Period,
        status: PeriodStatus,
        changed_by: &str,
    ) -> Result<PeriodLock, DatabaseError> {
        let _write = self.write_gate().await;
        let (locked_by, locked_at) = match status {
            PeriodStatus::Locked => (Some(changed_by.to_string()), Some(Utc::now())),
            PeriodStatus::Open => (None, None),
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO period_locks (year, month, status, locked_by, locked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (year, month) DO UPDATE SET
                     status = excluded.status,
                     locked_by = excluded.locked_by,
                     locked_at = excluded.locked_at",
                libsql::params![
                    i64::from(period.year),
                    i64::from(period.month),
                    status.as_str(),
                    locked_by.as_deref(),
                    locked_at.map(|t| t.to_rfc3339())
                ],
            )
            .await?;

        tracing::info!(%period, %status, changed_by, "period status changed");

        Ok(PeriodLock {
            period,
            status,
            locked_by,
            locked_at,
        })
    }
}

//! Revision ledger: append-only, per-entry contiguous numbering.
//!
//! The next revision number is computed inside the INSERT itself
//! (`COALESCE(MAX(revision_number), 0) + 1`), so no separate read can go
//! stale between numbering and writing. `UNIQUE(entry_id, revision_number)`
//! turns any residual race into an error that the caller retries.

use chrono::{DateTime, Utc};

use cap_core::entities::{FieldChange, RevisionRecord};
use cap_core::identity::Actor;
use cap_core::ids::PREFIX_REVISION;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::retry::{RetryConfig, with_retry};
use crate::service::CapService;

const SELECT_COLS: &str = "id, entry_id, revision_number, field, old_value, new_value, \
     changed_by, reason, auth_method, created_at";

fn row_to_revision(row: &libsql::Row) -> Result<RevisionRecord, DatabaseError> {
    Ok(RevisionRecord {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        revision_number: row.get(2)?,
        field: parse_enum(&row.get::<String>(3)?)?,
        old_value: get_opt_string(row, 4)?,
        new_value: get_opt_string(row, 5)?,
        changed_by: row.get(6)?,
        reason: get_opt_string(row, 7)?,
        auth_method: parse_enum(&row.get::<String>(8)?)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

async fn insert_next(
    conn: &libsql::Connection,
    id: &str,
    entry_id: &str,
    change: &FieldChange,
    actor: &Actor,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO entry_revisions
             (id, entry_id, revision_number, field, old_value, new_value,
              changed_by, reason, auth_method, created_at)
         SELECT ?1, ?2, COALESCE(MAX(revision_number), 0) + 1, ?3, ?4, ?5, ?6, ?7, ?8, ?9
         FROM entry_revisions WHERE entry_id = ?2",
        libsql::params![
            id,
            entry_id,
            change.field.as_str(),
            change.old_value.as_deref(),
            change.new_value.as_deref(),
            actor.id.as_str(),
            reason,
            actor.auth_method.as_str(),
            now.to_rfc3339()
        ],
    )
    .await?;

    let mut rows = conn
        .query(
            "SELECT revision_number FROM entry_revisions WHERE id = ?1",
            [id],
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<i64>(0)?)
}

/// Append one record per non-noop change, in order.
///
/// Must run on the connection of an open write transaction.
pub(crate) async fn append_revisions(
    conn: &libsql::Connection,
    retry: &RetryConfig,
    entry_id: &str,
    changes: &[FieldChange],
    actor: &Actor,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<RevisionRecord>, DatabaseError> {
    let mut records = Vec::new();
    for change in changes.iter().filter(|c| !c.is_noop()) {
        let id = crate::generate_id(conn, PREFIX_REVISION).await?;
        let revision_number = with_retry(retry, DatabaseError::is_unique_violation, || {
            insert_next(conn, &id, entry_id, change, actor, reason, now)
        })
        .await?;

        records.push(RevisionRecord {
            id,
            entry_id: entry_id.to_string(),
            revision_number,
            field: change.field,
            old_value: change.old_value.clone(),
            new_value: change.new_value.clone(),
            changed_by: actor.id.clone(),
            reason: reason.map(String::from),
            auth_method: actor.auth_method,
            created_at: now,
        });
    }
    Ok(records)
}

pub(crate) async fn query_revisions(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<Vec<RevisionRecord>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM entry_revisions WHERE entry_id = ?1 ORDER BY revision_number"
            ),
            [entry_id],
        )
        .await?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(row_to_revision(&row)?);
    }
    Ok(records)
}

impl CapService {
    /// The entry's ledger in revision order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_revisions(&self, entry_id: &str) -> Result<Vec<RevisionRecord>, DatabaseError> {
        let _read = self.read_gate().await;
        query_revisions(self.db().conn(), entry_id).await
    }
}

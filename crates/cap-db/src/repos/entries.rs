//! Entry repository: insert, lookup, filtered listing, column updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use cap_core::entities::Entry;
use cap_core::enums::{EntryKind, EntryStatus};

use crate::error::DatabaseError;
use crate::helpers::{
    format_date, get_bool, get_opt_string, parse_date, parse_datetime, parse_enum,
    parse_optional_datetime, parse_optional_enum, parse_string_list, to_json_list,
};
use crate::service::CapService;
use crate::updates::entry::EntryUpdate;

const SELECT_COLS: &str = "id, kind, developer_id, project_id, date, \
     estimated_hours, phase_suggested, description_suggested, source_session_ids, \
     source_commit_ids, enhancement_suggested, hours_confirmed, phase_confirmed, \
     description_confirmed, confirmed_at, confirmed_by, confirmation_method, \
     adjustment_reason, status, reviewed_by, reviewed_at, rejection_reason, \
     created_at, updated_at";

/// Hard cap on rows returned by a listing.
pub const MAX_LIST_LIMIT: u32 = 1_000;

/// Query filter for entry listings. Unset fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntryFilter {
    pub developer_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<EntryStatus>,
    pub kind: Option<EntryKind>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Window over a listing that has no other filters.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<Page> for EntryFilter {
    fn from(page: Page) -> Self {
        Self {
            limit: page.limit,
            offset: page.offset,
            ..Self::default()
        }
    }
}

fn row_to_entry(row: &libsql::Row) -> Result<Entry, DatabaseError> {
    Ok(Entry {
        id: row.get(0)?,
        kind: parse_enum(&row.get::<String>(1)?)?,
        developer_id: row.get(2)?,
        project_id: get_opt_string(row, 3)?,
        date: parse_date(&row.get::<String>(4)?)?,
        estimated_hours: row.get(5)?,
        phase_suggested: parse_enum(&row.get::<String>(6)?)?,
        description_suggested: get_opt_string(row, 7)?,
        source_session_ids: parse_string_list(&row.get::<String>(8)?)?,
        source_commit_ids: parse_string_list(&row.get::<String>(9)?)?,
        enhancement_suggested: get_bool(row, 10)?,
        hours_confirmed: row.get::<Option<f64>>(11)?,
        phase_confirmed: parse_optional_enum(get_opt_string(row, 12)?.as_deref())?,
        description_confirmed: get_opt_string(row, 13)?,
        confirmed_at: parse_optional_datetime(get_opt_string(row, 14)?.as_deref())?,
        confirmed_by: get_opt_string(row, 15)?,
        confirmation_method: parse_optional_enum(get_opt_string(row, 16)?.as_deref())?,
        adjustment_reason: get_opt_string(row, 17)?,
        status: parse_enum(&row.get::<String>(18)?)?,
        reviewed_by: get_opt_string(row, 19)?,
        reviewed_at: parse_optional_datetime(get_opt_string(row, 20)?.as_deref())?,
        rejection_reason: get_opt_string(row, 21)?,
        created_at: parse_datetime(&row.get::<String>(22)?)?,
        updated_at: parse_datetime(&row.get::<String>(23)?)?,
    })
}

async fn collect_entries(mut rows: libsql::Rows) -> Result<Vec<Entry>, DatabaseError> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(row_to_entry(&row)?);
    }
    Ok(entries)
}

fn opt_text<T: ToString>(value: Option<T>) -> libsql::Value {
    value.map_or(libsql::Value::Null, |v| libsql::Value::Text(v.to_string()))
}

pub(crate) async fn insert_entry(
    conn: &libsql::Connection,
    entry: &Entry,
) -> Result<(), DatabaseError> {
    let params: Vec<libsql::Value> = vec![
        entry.id.clone().into(),
        entry.kind.as_str().into(),
        entry.developer_id.clone().into(),
        opt_text(entry.project_id.as_deref()),
        format_date(entry.date).into(),
        entry.estimated_hours.into(),
        entry.phase_suggested.as_str().into(),
        opt_text(entry.description_suggested.as_deref()),
        to_json_list(&entry.source_session_ids)?.into(),
        to_json_list(&entry.source_commit_ids)?.into(),
        i64::from(entry.enhancement_suggested).into(),
        entry.hours_confirmed.map_or(libsql::Value::Null, libsql::Value::Real),
        opt_text(entry.phase_confirmed.map(|p| p.as_str())),
        opt_text(entry.description_confirmed.as_deref()),
        opt_text(entry.confirmed_at.map(|t| t.to_rfc3339())),
        opt_text(entry.confirmed_by.as_deref()),
        opt_text(entry.confirmation_method.map(|m| m.as_str())),
        opt_text(entry.adjustment_reason.as_deref()),
        entry.status.as_str().into(),
        opt_text(entry.reviewed_by.as_deref()),
        opt_text(entry.reviewed_at.map(|t| t.to_rfc3339())),
        opt_text(entry.rejection_reason.as_deref()),
        entry.created_at.to_rfc3339().into(),
        entry.updated_at.to_rfc3339().into(),
    ];
    conn.execute(
        &format!(
            "INSERT INTO entries ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, \
             ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
        ),
        libsql::params_from_iter(params),
    )
    .await?;
    Ok(())
}

pub(crate) async fn fetch_entry(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Entry>, DatabaseError> {
    let mut rows = conn
        .query(&format!("SELECT {SELECT_COLS} FROM entries WHERE id = ?1"), [id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_entry(&row)?)),
        None => Ok(None),
    }
}

/// Apply `update` to entry `id` and stamp `updated_at`. Returns the stored row.
pub(crate) async fn update_entry(
    conn: &libsql::Connection,
    id: &str,
    update: &EntryUpdate,
    now: DateTime<Utc>,
) -> Result<Entry, DatabaseError> {
    let mut sets = Vec::new();
    let mut params: Vec<libsql::Value> = Vec::new();
    let mut push = |column: &str, value: libsql::Value| {
        params.push(value);
        sets.push(format!("{column} = ?{}", params.len()));
    };

    if let Some(ref project_id) = update.project_id {
        push("project_id", opt_text(project_id.as_deref()));
    }
    if let Some(phase) = update.phase_suggested {
        push("phase_suggested", phase.as_str().into());
    }
    if let Some(flag) = update.enhancement_suggested {
        push("enhancement_suggested", i64::from(flag).into());
    }
    if let Some(hours) = update.hours_confirmed {
        push(
            "hours_confirmed",
            hours.map_or(libsql::Value::Null, libsql::Value::Real),
        );
    }
    if let Some(phase) = update.phase_confirmed {
        push("phase_confirmed", opt_text(phase.map(|p| p.as_str())));
    }
    if let Some(ref description) = update.description_confirmed {
        push("description_confirmed", opt_text(description.as_deref()));
    }
    if let Some(at) = update.confirmed_at {
        push("confirmed_at", opt_text(at.map(|t| t.to_rfc3339())));
    }
    if let Some(ref by) = update.confirmed_by {
        push("confirmed_by", opt_text(by.as_deref()));
    }
    if let Some(method) = update.confirmation_method {
        push("confirmation_method", opt_text(method.map(|m| m.as_str())));
    }
    if let Some(ref reason) = update.adjustment_reason {
        push("adjustment_reason", opt_text(reason.as_deref()));
    }
    if let Some(status) = update.status {
        push("status", status.as_str().into());
    }
    if let Some(ref by) = update.reviewed_by {
        push("reviewed_by", opt_text(by.as_deref()));
    }
    if let Some(at) = update.reviewed_at {
        push("reviewed_at", opt_text(at.map(|t| t.to_rfc3339())));
    }
    if let Some(ref reason) = update.rejection_reason {
        push("rejection_reason", opt_text(reason.as_deref()));
    }

    if !update.is_empty() {
        params.push(now.to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(id.into());
        let sql = format!(
            "UPDATE entries SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );
        conn.execute(&sql, libsql::params_from_iter(params)).await?;
    }

    fetch_entry(conn, id).await?.ok_or(DatabaseError::NoResult)
}

fn where_clause(filter: &EntryFilter) -> (String, Vec<libsql::Value>) {
    let mut clauses = Vec::new();
    let mut params: Vec<libsql::Value> = Vec::new();
    let mut push = |clause: &str, value: libsql::Value| {
        params.push(value);
        clauses.push(format!("{clause} ?{}", params.len()));
    };

    if let Some(ref developer_id) = filter.developer_id {
        push("developer_id =", developer_id.clone().into());
    }
    if let Some(ref project_id) = filter.project_id {
        push("project_id =", project_id.clone().into());
    }
    if let Some(status) = filter.status {
        push("status =", status.as_str().into());
    }
    if let Some(kind) = filter.kind {
        push("kind =", kind.as_str().into());
    }
    if let Some(from) = filter.date_from {
        push("date >=", format_date(from).into());
    }
    if let Some(to) = filter.date_to {
        push("date <=", format_date(to).into());
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// One page of entries matching `filter`, at most `MAX_LIST_LIMIT` rows.
pub(crate) async fn query_entries(
    conn: &libsql::Connection,
    filter: &EntryFilter,
) -> Result<Vec<Entry>, DatabaseError> {
    let (where_clause, params) = where_clause(filter);
    let limit = filter.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let offset = filter.offset.unwrap_or(0);
    let sql = format!(
        "SELECT {SELECT_COLS} FROM entries{where_clause} \
         ORDER BY date, created_at, id LIMIT {limit} OFFSET {offset}"
    );
    let rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
    collect_entries(rows).await
}

/// Every entry matching `filter`. Paging fields are ignored.
pub(crate) async fn query_all_entries(
    conn: &libsql::Connection,
    filter: &EntryFilter,
) -> Result<Vec<Entry>, DatabaseError> {
    let (where_clause, params) = where_clause(filter);
    let sql = format!("SELECT {SELECT_COLS} FROM entries{where_clause} ORDER BY date, created_at, id");
    let rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
    collect_entries(rows).await
}

impl CapService {
    /// Look up an entry. `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_entry(&self, id: &str) -> Result<Option<Entry>, DatabaseError> {
        let _read = self.read_gate().await;
        fetch_entry(self.db().conn(), id).await
    }

    /// One page of entries matching `filter`, ordered by date.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, DatabaseError> {
        let _read = self.read_gate().await;
        query_entries(self.db().conn(), filter).await
    }

    /// All of the developer's `pending` entries dated within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn pending_entries_for(
        &self,
        developer_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>, DatabaseError> {
        let filter = EntryFilter {
            developer_id: Some(developer_id.to_string()),
            status: Some(EntryStatus::Pending),
            date_from: Some(start),
            date_to: Some(end),
            ..EntryFilter::default()
        };
        let _read = self.read_gate().await;
        query_all_entries(self.db().conn(), &filter).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use cap_core::enums::{ConfirmationMethod, EntryStatus, ProjectPhase};

    use super::*;
    use crate::test_support::helpers::{daily_entry, test_service};
    use crate::updates::entry::EntryUpdateBuilder;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrip() {
        let svc = test_service().await;
        let mut entry = daily_entry("ent-00000001", "dev-1", None, jan(5), 5.0);
        entry.source_session_ids = vec!["ses-a".into(), "ses-b".into()];
        entry.enhancement_suggested = true;
        insert_entry(svc.db().conn(), &entry).await.unwrap();

        let fetched = svc.find_entry("ent-00000001").await.unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let svc = test_service().await;
        assert!(svc.find_entry("ent-nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_writes_only_set_columns() {
        let svc = test_service().await;
        let entry = daily_entry("ent-00000002", "dev-1", None, jan(5), 5.0);
        insert_entry(svc.db().conn(), &entry).await.unwrap();

        let now = Utc::now();
        let update = EntryUpdateBuilder::new()
            .confirmation(
                6.5,
                ProjectPhase::ApplicationDevelopment,
                Some("pairing".into()),
                "dev-1",
                ConfirmationMethod::Single,
                now,
            )
            .adjustment_reason(Some("pairing not captured".into()))
            .status(EntryStatus::Confirmed)
            .build();
        let updated = update_entry(svc.db().conn(), &entry.id, &update, now)
            .await
            .unwrap();

        assert_eq!(updated.hours_confirmed, Some(6.5));
        assert_eq!(updated.status, EntryStatus::Confirmed);
        assert_eq!(updated.confirmation_method, Some(ConfirmationMethod::Single));
        assert_eq!(updated.estimated_hours, 5.0);
        assert_eq!(updated.description_suggested, entry.description_suggested);

        let cleared = update_entry(
            svc.db().conn(),
            &entry.id,
            &EntryUpdateBuilder::new().clear_confirmation().build(),
            now,
        )
        .await
        .unwrap();
        assert!(cleared.is_confirmed_view_empty());
        assert_eq!(cleared.confirmed_by, None);
    }

    #[tokio::test]
    async fn filter_by_developer_status_and_dates() {
        let svc = test_service().await;
        let conn = svc.db().conn();
        insert_entry(conn, &daily_entry("ent-00000003", "dev-1", None, jan(5), 1.0))
            .await
            .unwrap();
        insert_entry(conn, &daily_entry("ent-00000004", "dev-1", None, jan(6), 1.0))
            .await
            .unwrap();
        insert_entry(conn, &daily_entry("ent-00000005", "dev-2", None, jan(5), 1.0))
            .await
            .unwrap();
        let mut confirmed = daily_entry("ent-00000006", "dev-1", None, jan(5), 1.0);
        confirmed.status = EntryStatus::Confirmed;
        insert_entry(conn, &confirmed).await.unwrap();

        let pending = svc.pending_entries_for("dev-1", jan(5), jan(5)).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ent-00000003"]);

        let all_dev1 = svc
            .list_entries(&EntryFilter {
                developer_id: Some("dev-1".into()),
                ..EntryFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all_dev1.len(), 3);

        let limited = svc
            .list_entries(&EntryFilter {
                limit: Some(2),
                ..EntryFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);

        let second_page = svc
            .list_entries(&EntryFilter {
                limit: Some(2),
                offset: Some(2),
                ..EntryFilter::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = second_page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ent-00000006", "ent-00000004"]);
    }

    #[tokio::test]
    async fn empty_update_leaves_row_untouched() {
        let svc = test_service().await;
        let entry = daily_entry("ent-00000007", "dev-1", None, jan(5), 5.0);
        insert_entry(svc.db().conn(), &entry).await.unwrap();

        let later = entry.updated_at + chrono::Duration::hours(1);
        let stored = update_entry(
            svc.db().conn(),
            &entry.id,
            &EntryUpdateBuilder::new().build(),
            later,
        )
        .await
        .unwrap();

        assert_eq!(stored.updated_at, entry.updated_at);
        assert_eq!(stored, entry);
    }

    #[tokio::test]
    async fn pending_candidates_are_not_capped() {
        let svc = test_service().await;
        let conn = svc.db().conn();
        let total = MAX_LIST_LIMIT as usize + 5;
        for i in 0..total {
            let entry = daily_entry(&format!("ent-{i:08x}"), "dev-1", None, jan(6), 1.0);
            insert_entry(conn, &entry).await.unwrap();
        }

        let pending = svc.pending_entries_for("dev-1", jan(6), jan(6)).await.unwrap();
        assert_eq!(pending.len(), total);

        let listed = svc.list_entries(&EntryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), MAX_LIST_LIMIT as usize);
    }
}

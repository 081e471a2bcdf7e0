//! Shared test utilities for cap-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use chrono::{NaiveDate, Utc};

    use cap_core::entities::Entry;
    use cap_core::enums::{EntryKind, EntryStatus, ProjectPhase};

    use crate::CapDb;
    use crate::service::CapService;
    use crate::trail::writer::TrailWriter;

    /// Create an in-memory `CapService` with trail disabled.
    pub async fn test_service() -> CapService {
        let db = CapDb::open_local(":memory:").await.unwrap();
        CapService::from_db(db, TrailWriter::disabled())
    }

    /// Create an in-memory `CapService` with trail enabled writing to a temp dir.
    pub async fn test_service_with_trail(trail_dir: std::path::PathBuf) -> CapService {
        let db = CapDb::open_local(":memory:").await.unwrap();
        let trail = TrailWriter::new(trail_dir).unwrap();
        CapService::from_db(db, trail)
    }

    /// A `pending` daily entry with an empty confirmed view.
    pub fn daily_entry(
        id: &str,
        developer_id: &str,
        project_id: Option<&str>,
        date: NaiveDate,
        estimated_hours: f64,
    ) -> Entry {
        let now = Utc::now();
        Entry {
            id: id.to_string(),
            kind: EntryKind::Daily,
            developer_id: developer_id.to_string(),
            project_id: project_id.map(String::from),
            date,
            estimated_hours,
            phase_suggested: ProjectPhase::ApplicationDevelopment,
            description_suggested: Some("Suggested from session telemetry".into()),
            source_session_ids: Vec::new(),
            source_commit_ids: Vec::new(),
            enhancement_suggested: false,
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
        }
    }
}

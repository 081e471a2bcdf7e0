//! Project repository.

use chrono::Utc;

use cap_core::entities::Project;
use cap_core::enums::ProjectPhase;
use cap_core::ids::PREFIX_PROJECT;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_datetime, parse_enum};
use crate::service::CapService;

const SELECT_COLS: &str =
    "id, name, phase, parent_project_id, requires_manager_approval, created_at";

/// Input for registering a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub phase: ProjectPhase,
    pub parent_project_id: Option<String>,
    pub requires_manager_approval: bool,
}

impl NewProject {
    pub fn new(name: impl Into<String>, phase: ProjectPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            parent_project_id: None,
            requires_manager_approval: false,
        }
    }

    /// Mark this project as an enhancement of `parent_id`.
    #[must_use]
    pub fn enhancing(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_project_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub const fn requiring_approval(mut self) -> Self {
        self.requires_manager_approval = true;
        self
    }
}

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        phase: parse_enum(&row.get::<String>(2)?)?,
        parent_project_id: get_opt_string(row, 3)?,
        requires_manager_approval: get_bool(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

pub(crate) async fn fetch_project(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Project>, DatabaseError> {
    let mut rows = conn
        .query(&format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"), [id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_project(&row)?)),
        None => Ok(None),
    }
}

impl CapService {
    /// Register a project. Projects are reference data; no revision is recorded.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails (e.g. unknown parent).
    pub async fn create_project(&self, input: NewProject) -> Result<Project, DatabaseError> {
        let _write = self.write_gate().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PROJECT).await?;

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    id.as_str(),
                    input.name.as_str(),
                    input.phase.as_str(),
                    input.parent_project_id.as_deref(),
                    i64::from(input.requires_manager_approval),
                    now.to_rfc3339()
                ],
            )
            .await?;

        tracing::debug!(project_id = %id, phase = %input.phase, "project created");

        Ok(Project {
            id,
            name: input.name,
            phase: input.phase,
            parent_project_id: input.parent_project_id,
            requires_manager_approval: input.requires_manager_approval,
            created_at: now,
        })
    }

    /// Look up a project. `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        let _read = self.read_gate().await;
        fetch_project(self.db().conn(), id).await
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProjectPhase;

/// A capitalizable software project.
///
/// A project with a `parent_project_id` is an enhancement layered onto its parent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub phase: ProjectPhase,
    pub parent_project_id: Option<String>,
    pub requires_manager_approval: bool,
    pub created_at: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub const fn is_enhancement(&self) -> bool {
        self.parent_project_id.is_some()
    }

    /// Whether this project is a valid reassignment target for time logged
    /// against `current_project_id`.
    #[must_use]
    pub fn is_enhancement_of(&self, current_project_id: Option<&str>) -> bool {
        match (self.parent_project_id.as_deref(), current_project_id) {
            (Some(parent), Some(current)) => parent == current,
            _ => false,
        }
    }
}

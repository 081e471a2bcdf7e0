//! Fixtures for engine unit tests.

use chrono::NaiveDate;

use cap_core::entities::{Entry, Project};
use cap_core::enums::{PeriodStatus, ProjectPhase, Role};
use cap_core::identity::Actor;
use cap_core::period::Period;
use cap_db::{CapService, NewProject};

use crate::engine::WorkflowEngine;
use crate::inputs::SuggestionInput;

pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

pub fn dev(id: &str) -> Actor {
    Actor::new(id, Role::Developer)
}

pub fn manager(id: &str) -> Actor {
    Actor::new(id, Role::Manager)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

/// An in-memory engine seeded with a parent project, one enhancement of it,
/// and a project that requires manager approval.
pub struct Fixture {
    pub engine: WorkflowEngine,
    pub parent: Project,
    pub child: Project,
    pub gated: Project,
}

impl Fixture {
    pub async fn new() -> Self {
        let service = CapService::new_local(":memory:", None).await.unwrap();
        let parent = service
            .create_project(NewProject::new("Billing platform", ProjectPhase::ApplicationDevelopment))
            .await
            .unwrap();
        let child = service
            .create_project(
                NewProject::new("Billing exports", ProjectPhase::ApplicationDevelopment)
                    .enhancing(&parent.id),
            )
            .await
            .unwrap();
        let gated = service
            .create_project(
                NewProject::new("Ledger migration", ProjectPhase::ApplicationDevelopment)
                    .requiring_approval(),
            )
            .await
            .unwrap();
        Self {
            engine: WorkflowEngine::new(service),
            parent,
            child,
            gated,
        }
    }

    pub fn suggestion_input(
        &self,
        developer_id: &str,
        project_id: Option<&str>,
        date: NaiveDate,
        hours: f64,
    ) -> SuggestionInput {
        SuggestionInput {
            developer_id: developer_id.to_string(),
            project_id: project_id.map(String::from),
            date,
            estimated_hours: hours,
            phase_suggested: ProjectPhase::ApplicationDevelopment,
            description_suggested: Some("Invoice export pipeline".into()),
            source_session_ids: vec!["ses-1".into()],
            source_commit_ids: Vec::new(),
            enhancement_suggested: false,
        }
    }

    /// Ingest a pending daily entry.
    pub async fn suggest(
        &self,
        developer_id: &str,
        project_id: &str,
        date: NaiveDate,
        hours: f64,
    ) -> Entry {
        let input = self.suggestion_input(developer_id, Some(project_id), date, hours);
        self.engine.ingest_suggestion(input, &admin()).await.unwrap()
    }

    pub async fn lock(&self, date: NaiveDate) {
        self.engine
            .service()
            .set_period_status(Period::of(date), PeriodStatus::Locked, "admin-1")
            .await
            .unwrap();
    }
}

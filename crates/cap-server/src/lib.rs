//! # cap-server
//!
//! JSON-over-HTTP surface for captrack. Routes map one-to-one onto
//! [`cap_workflow::WorkflowEngine`] operations; identity arrives in request
//! headers (see [`extract`]).

pub mod error;
pub mod extract;
mod handlers;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use cap_config::CapConfig;
use cap_db::CapService;
use cap_workflow::WorkflowEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: WorkflowEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Open the configured database and trail directory.
    ///
    /// # Errors
    ///
    /// Fails if the database directory cannot be created or the database
    /// cannot be opened and migrated.
    pub async fn bootstrap(config: &CapConfig) -> anyhow::Result<Self> {
        let db = &config.database;
        if !db.is_in_memory() {
            if let Some(parent) = Path::new(&db.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }
        let service = CapService::new_local(&db.path, db.trail_path())
            .await
            .with_context(|| format!("failed to open database at {}", db.path))?;
        Ok(Self::new(WorkflowEngine::new(service)))
    }
}

pub fn build_router(state: AppState) -> Router {
    let entries = Router::new()
        .route("/", get(handlers::list_entries))
        .route("/ingest", post(handlers::ingest_suggestion))
        .route("/manual", post(handlers::log_manual_entry))
        .route("/bulk-confirm", post(handlers::bulk_confirm))
        .route("/bulk-reassign", post(handlers::bulk_reassign))
        .route("/:id", get(handlers::get_entry))
        .route("/:id/revisions", get(handlers::list_revisions))
        .route("/:id/confirm", post(handlers::confirm))
        .route("/:id/approve", post(handlers::approve))
        .route("/:id/reject", post(handlers::reject))
        .route("/:id/reassign", post(handlers::reassign));

    let api = Router::new()
        .nest("/entries", entries)
        .route("/approvals/pending", get(handlers::list_pending_approvals))
        .route("/periods/:period", get(handlers::get_period));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

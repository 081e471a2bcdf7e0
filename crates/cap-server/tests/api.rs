//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use cap_core::entities::Project;
use cap_core::enums::{PeriodStatus, ProjectPhase};
use cap_core::period::Period;
use cap_db::{CapService, NewProject};
use cap_server::{AppState, build_router};
use cap_workflow::WorkflowEngine;

struct TestApp {
    router: Router,
    state: AppState,
    parent: Project,
    child: Project,
    gated: Project,
}

impl TestApp {
    async fn new() -> Self {
        let service = CapService::new_local(":memory:", None).await.unwrap();
        let parent = service
            .create_project(NewProject::new("Payroll", ProjectPhase::ApplicationDevelopment))
            .await
            .unwrap();
        let child = service
            .create_project(
                NewProject::new("Payroll tax tables", ProjectPhase::ApplicationDevelopment)
                    .enhancing(&parent.id),
            )
            .await
            .unwrap();
        let gated = service
            .create_project(
                NewProject::new("Treasury", ProjectPhase::ApplicationDevelopment)
                    .requiring_approval(),
            )
            .await
            .unwrap();
        let state = AppState::new(WorkflowEngine::new(service));
        Self {
            router: build_router(state.clone()),
            state,
            parent,
            child,
            gated,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        actor: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = actor {
            builder = builder.header("x-actor-id", id).header("x-actor-role", role);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn ingest(&self, developer: &str, project_id: &str, date: &str, hours: f64) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/entries/ingest",
                Some(("admin-1", "admin")),
                Some(json!({
                    "developer_id": developer,
                    "project_id": project_id,
                    "date": date,
                    "estimated_hours": hours,
                    "phase_suggested": "application_development",
                    "description_suggested": "Tax table import",
                    "source_session_ids": ["ses-1"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

const DEV: Option<(&str, &str)> = Some(("dev-1", "developer"));
const MANAGER: Option<(&str, &str)> = Some(("mgr-1", "manager"));

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/api/v1/entries", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn confirm_requires_reason_for_large_adjustment() {
    let app = TestApp::new().await;
    let id = app.ingest("dev-1", &app.parent.id, "2026-01-05", 5.0).await;
    let uri = format!("/api/v1/entries/{id}/confirm");

    let (status, body) = app.send("POST", &uri, DEV, Some(json!({"hours": 6.5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app
        .send(
            "POST",
            &uri,
            DEV,
            Some(json!({"hours": 6.5, "adjustment_reason": "Pairing not captured"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["hours_confirmed"], 6.5);

    let (status, body) = app
        .send("GET", &format!("/api/v1/entries/{id}/revisions"), DEV, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let fields: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["hours_confirmed", "status"]);
}

#[tokio::test]
async fn other_developers_entries_are_forbidden() {
    let app = TestApp::new().await;
    let id = app.ingest("dev-2", &app.parent.id, "2026-01-05", 2.0).await;
    let (status, body) = app
        .send("GET", &format!("/api/v1/entries/{id}"), DEV, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_OWNER");

    let (status, _) = app
        .send("GET", "/api/v1/entries/ent-00000000", DEV, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_flow_and_self_approval() {
    let app = TestApp::new().await;
    let id = app.ingest("mgr-1", &app.gated.id, "2026-01-07", 3.0).await;
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/v1/entries/{id}/confirm"),
            MANAGER,
            Some(json!({"hours": 3.0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending_approval");

    let (status, body) = app
        .send("POST", &format!("/api/v1/entries/{id}/approve"), MANAGER, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "SELF_APPROVAL");

    let (status, body) = app.send("GET", "/api/v1/approvals/pending", DEV, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_ROLE");

    let other_manager = Some(("mgr-2", "manager"));
    let (status, body) = app
        .send("GET", "/api/v1/approvals/pending?limit=1&offset=0", other_manager, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = app
        .send("GET", "/api/v1/approvals/pending?offset=1", other_manager, None)
        .await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/v1/entries/{id}/reject"),
            other_manager,
            Some(json!({"reason": "Treasury work is booked as overhead"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (status, body) = app
        .send("POST", &format!("/api/v1/entries/{id}/approve"), other_manager, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn locked_period_returns_423() {
    let app = TestApp::new().await;
    let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    app.state
        .engine
        .service()
        .set_period_status(Period::of(date), PeriodStatus::Locked, "admin-1")
        .await
        .unwrap();

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/entries/manual",
            DEV,
            Some(json!({"project_id": app.parent.id, "date": "2026-01-15", "hours": 1.5})),
        )
        .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "PERIOD_LOCKED");

    let (status, body) = app.send("GET", "/api/v1/periods/2026-01", DEV, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "locked");

    let (status, body) = app.send("GET", "/api/v1/periods/2026-13", DEV, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn manual_entries_route_on_amount() {
    let app = TestApp::new().await;
    for (hours, expected) in [(1.5, "confirmed"), (8.0, "pending_approval")] {
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/entries/manual",
                DEV,
                Some(json!({"project_id": app.parent.id, "date": "2026-01-20", "hours": hours})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], expected);
        assert_eq!(body["kind"], "manual");
    }
}

#[tokio::test]
async fn bulk_endpoints_report_partial_success() {
    let app = TestApp::new().await;
    app.ingest("dev-1", &app.parent.id, "2026-01-12", 2.0).await;
    app.ingest("dev-1", &app.parent.id, "2026-01-13", 3.0).await;
    let others = app.ingest("dev-2", &app.parent.id, "2026-01-12", 2.0).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/entries/bulk-confirm",
            DEV,
            Some(json!({"start": "2026-01-12", "end": "2026-01-13"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], 2);
    assert_eq!(body["by_date"]["2026-01-12"], 1);

    let valid = app.ingest("dev-1", &app.parent.id, "2026-01-14", 2.0).await;
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/entries/bulk-reassign",
            DEV,
            Some(json!({"entry_ids": [others, valid], "project_id": app.child.id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reassigned"], json!([valid]));
    assert_eq!(body["skipped"][0]["reason"], "Not your entry");
    assert_eq!(body["skipped_count"], 1);
}

#[tokio::test]
async fn malformed_bodies_are_validation_failures() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/entries/bulk-confirm",
            DEV,
            Some(json!({"when": "tomorrow"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app
        .send("GET", "/api/v1/entries?status=archived", DEV, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

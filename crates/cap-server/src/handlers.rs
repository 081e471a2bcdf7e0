use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use cap_core::entities::{Entry, PeriodLock, RevisionRecord};
use cap_core::period::Period;
use cap_core::responses::{BulkConfirmResponse, BulkReassignResponse};
use cap_db::{EntryFilter, Page};
use cap_workflow::inputs::{BulkConfirmTarget, ConfirmFields, ManualEntryInput, SuggestionInput};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, RequestActor};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "captrackd",
    })
}

pub async fn ingest_suggestion(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(input): ApiJson<SuggestionInput>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let entry = state.engine.ingest_suggestion(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn log_manual_entry(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(input): ApiJson<ManualEntryInput>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let entry = state.engine.log_manual_entry(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiQuery(filter): ApiQuery<EntryFilter>,
) -> ApiResult<Vec<Entry>> {
    Ok(Json(state.engine.list_entries(filter, &actor).await?))
}

pub async fn get_entry(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<Entry> {
    Ok(Json(state.engine.get_entry(&id, &actor).await?))
}

pub async fn list_revisions(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<Vec<RevisionRecord>> {
    Ok(Json(state.engine.list_revisions(&id, &actor).await?))
}

pub async fn confirm(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<ConfirmFields>,
) -> ApiResult<Entry> {
    Ok(Json(state.engine.confirm(&id, fields, &actor).await?))
}

pub async fn bulk_confirm(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(target): ApiJson<BulkConfirmTarget>,
) -> ApiResult<BulkConfirmResponse> {
    Ok(Json(state.engine.bulk_confirm(target, &actor).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<Entry> {
    Ok(Json(state.engine.approve(&id, &actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    reason: String,
}

pub async fn reject(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RejectRequest>,
) -> ApiResult<Entry> {
    Ok(Json(state.engine.reject(&id, &body.reason, &actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    project_id: String,
}

pub async fn reassign(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReassignRequest>,
) -> ApiResult<Entry> {
    Ok(Json(
        state.engine.reassign(&id, &body.project_id, &actor).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct BulkReassignRequest {
    entry_ids: Vec<String>,
    project_id: String,
}

pub async fn bulk_reassign(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(body): ApiJson<BulkReassignRequest>,
) -> ApiResult<BulkReassignResponse> {
    let response = state
        .engine
        .bulk_reassign(&body.entry_ids, &body.project_id, &actor)
        .await?;
    Ok(Json(response))
}

pub async fn list_pending_approvals(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Vec<Entry>> {
    Ok(Json(state.engine.list_pending_approvals(page, &actor).await?))
}

pub async fn get_period(
    State(state): State<AppState>,
    RequestActor(_actor): RequestActor,
    Path(raw): Path<String>,
) -> ApiResult<PeriodLock> {
    let period: Period = raw.parse()?;
    Ok(Json(state.engine.get_period(period).await?))
}

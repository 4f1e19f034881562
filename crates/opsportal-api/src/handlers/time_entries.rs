use crate::auth::models::ActorContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use opsportal_core::models::{
    LogTimeRequest, LogTimeResponse, TimeEntryListResponse, TimeEntryQuery,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/plan-assignments/{id}/time",
    tag = "time-entries",
    params(
        ("id" = Uuid, Path, description = "Plan assignment ID"),
        ("Idempotency-Key" = Option<String>, Header, description = "Replays the first response for retries of the same entry")
    ),
    request_body = LogTimeRequest,
    responses(
        (status = 201, description = "Time entry logged", body = LogTimeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller may not log time", body = ErrorResponse),
        (status = 404, description = "Plan assignment not found", body = ErrorResponse),
        (status = 409, description = "Assignment does not accept time entries", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, actor, body), fields(plan_assignment_id = %id))]
pub async fn log_time(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<LogTimeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.time_logging.log_time(&actor, id, body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/plan-assignments/{id}/time",
    tag = "time-entries",
    params(
        ("id" = Uuid, Path, description = "Plan assignment ID"),
        TimeEntryQuery
    ),
    responses(
        (status = 200, description = "Page of time entries, newest first", body = TimeEntryListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Plan assignment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, actor, query), fields(plan_assignment_id = %id))]
pub async fn list_time_entries(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    query: Result<Query<TimeEntryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(query) = query?;
    let page = state.time_logging.list_time(&actor, id, query).await?;
    Ok(Json(page))
}

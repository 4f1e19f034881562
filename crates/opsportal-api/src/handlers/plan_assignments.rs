use crate::auth::models::ActorContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::AssignmentUsageResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Assignment with its plan and the usage of both hour pools
#[utoipa::path(
    get,
    path = "/api/plan-assignments/{id}",
    tag = "plan-assignments",
    params(
        ("id" = Uuid, Path, description = "Plan assignment ID")
    ),
    responses(
        (status = 200, description = "Plan assignment found", body = AssignmentUsageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Plan assignment not found", body = ErrorResponse)
    )
)]
pub async fn get_plan_assignment(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let detail = state.time_logging.usage_summary(&actor, id).await?;
    Ok(Json(detail))
}

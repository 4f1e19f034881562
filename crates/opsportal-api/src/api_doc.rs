//! OpenAPI documentation

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::services;
use opsportal_core::{models, usage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Opsportal API",
        version = "0.1.0",
        description = "Plan assignment hour accounting: log support and dev hours against an organization's plan and track included hours, remaining hours and overage. All endpoints require a bearer token (JWT or the master API key)."
    ),
    paths(
        handlers::time_entries::log_time,
        handlers::time_entries::list_time_entries,
        handlers::plan_assignments::get_plan_assignment,
    ),
    components(
        schemas(
            models::WorkType,
            models::TimeEntry,
            models::LogTimeRequest,
            models::LogTimeResponse,
            models::TimeEntryListResponse,
            models::Plan,
            models::PlanAssignment,
            models::PlanAssignmentStatus,
            usage::PoolSummary,
            usage::UsageSummary,
            services::AssignmentUsageResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "time-entries", description = "Log and list hours worked against a plan assignment"),
        (name = "plan-assignments", description = "Plan assignments and their hour pool usage")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

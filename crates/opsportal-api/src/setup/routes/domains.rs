//! Domain route groups

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub fn plan_assignment_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/plan-assignments/{{id}}", API_PREFIX),
            get(handlers::plan_assignments::get_plan_assignment),
        )
        .route(
            &format!("{}/plan-assignments/{{id}}/time", API_PREFIX),
            get(handlers::time_entries::list_time_entries).post(handlers::time_entries::log_time),
        )
        .with_state(state)
}

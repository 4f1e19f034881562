//! Time entry API integration tests.
//!
//! Run with: `cargo test -p opsportal-api --test time_entries_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::auth::{master_bearer, test_user};
use helpers::fixtures::{count_time_entries, seed_assignment, seed_hours};
use helpers::{api_path, setup_test_app};
use opsportal_core::models::{PlanAssignmentStatus, UserRole, WorkType};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

fn time_path(assignment_id: uuid::Uuid) -> String {
    api_path(&format!("/plan-assignments/{}/time", assignment_id))
}

#[tokio::test]
async fn test_exceeding_included_hours_reports_overage() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;
    seed_hours(app.pool(), &seeded, Decimal::from(9), WorkType::Support).await;
    let staff = test_user(seeded.organization_id, UserRole::Staff);

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", staff.bearer())
        .json(&json!({
            "description": "Restored mail relay",
            "hours": 2,
            "work_type": "support"
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["will_exceed_limit"], true);
    assert_eq!(body["overage_hours"].as_f64(), Some(1.0));
    assert_eq!(body["support_hours_used"].as_f64(), Some(11.0));
    assert_eq!(body["support_hours_remaining"].as_f64(), Some(0.0));
    assert_eq!(body["dev_hours_remaining"].as_f64(), Some(5.0));
    assert_eq!(body["entry"]["created_by"], staff.user_id.to_string());
    assert_eq!(body["entry"]["billable"], true);
}

#[tokio::test]
async fn test_logging_remaining_hours_exactly_does_not_exceed() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;
    seed_hours(app.pool(), &seeded, Decimal::from_str("3.5").unwrap(), WorkType::Dev).await;

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "Schema migration",
            "hours": 1.5,
            "work_type": "dev"
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["will_exceed_limit"], false);
    assert_eq!(body["overage_hours"].as_f64(), Some(0.0));
    assert_eq!(body["dev_hours_remaining"].as_f64(), Some(0.0));
    assert_eq!(body["dev_hours_used"].as_f64(), Some(5.0));
}

#[tokio::test]
async fn test_logging_a_tenth_past_remaining_reports_small_overage() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::GracePeriod).await;
    seed_hours(app.pool(), &seeded, Decimal::from(8), WorkType::Support).await;

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "Certificate renewal",
            "hours": 2.1,
            "work_type": "support"
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["will_exceed_limit"], true);
    assert_eq!(body["overage_hours"].as_f64(), Some(0.1));
}

#[tokio::test]
async fn test_cancelled_assignment_rejects_time() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Cancelled).await;

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "Late work",
            "hours": 1,
            "work_type": "support"
        }))
        .await;

    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "ASSIGNMENT_NOT_BILLABLE");

    let count = count_time_entries(app.pool(), seeded.assignment.id).await;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_invalid_body_returns_field_errors() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "  ",
            "hours": 0,
            "work_type": "support"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["fields"]["hours"].is_array());
    assert!(body["fields"]["description"].is_array());
}

#[tokio::test]
async fn test_body_missing_hours_returns_field_error() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;

    let response = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "Rotated TLS certificates",
            "work_type": "support"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["fields"]["hours"][0], "Field is required");
    assert_eq!(count_time_entries(app.pool(), seeded.assignment.id).await, 0);
}

#[tokio::test]
async fn test_unknown_assignment_returns_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&time_path(uuid::Uuid::new_v4()))
        .add_header("Authorization", master_bearer())
        .json(&json!({
            "description": "Nothing here",
            "hours": 1,
            "work_type": "dev"
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_idempotent_retry_logs_once() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;
    let body = json!({
        "description": "Investigated slow queries",
        "hours": 1.25,
        "work_type": "dev"
    });

    let first = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .add_header("Idempotency-Key", "retry-1")
        .json(&body)
        .await;
    assert_eq!(first.status_code(), 201);

    let second = app
        .client()
        .post(&time_path(seeded.assignment.id))
        .add_header("Authorization", master_bearer())
        .add_header("Idempotency-Key", "retry-1")
        .json(&body)
        .await;
    assert_eq!(second.status_code(), 201);
    assert_eq!(second.header("X-Idempotent-Replayed"), "true");
    assert_eq!(second.json::<Value>()["entry"]["id"], first.json::<Value>()["entry"]["id"]);

    let count = count_time_entries(app.pool(), seeded.assignment.id).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;
    seed_hours(app.pool(), &seeded, Decimal::from(1), WorkType::Support).await;
    seed_hours(app.pool(), &seeded, Decimal::from(2), WorkType::Support).await;
    seed_hours(app.pool(), &seeded, Decimal::from(3), WorkType::Dev).await;

    let response = app
        .client()
        .get(&time_path(seeded.assignment.id))
        .add_query_param("work_type", "support")
        .add_query_param("per_page", 1)
        .add_header("Authorization", master_bearer())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["per_page"], 1);
    assert_eq!(body["entries"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["entries"][0]["work_type"], "support");
}

#[tokio::test]
async fn test_list_rejects_inverted_date_range() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;

    let response = app
        .client()
        .get(&time_path(seeded.assignment.id))
        .add_query_param("from", "2024-06-10")
        .add_query_param("to", "2024-06-01")
        .add_header("Authorization", master_bearer())
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["fields"]["to"].is_array());
}

#[tokio::test]
async fn test_assignment_detail_includes_usage() {
    let app = setup_test_app().await;
    let seeded = seed_assignment(app.pool(), PlanAssignmentStatus::Active).await;
    seed_hours(app.pool(), &seeded, Decimal::from(12), WorkType::Support).await;

    let response = app
        .client()
        .get(&api_path(&format!("/plan-assignments/{}", seeded.assignment.id)))
        .add_header("Authorization", master_bearer())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["plan"]["id"], seeded.plan.id.to_string());
    assert_eq!(body["usage"]["support"]["overage_hours"].as_f64(), Some(2.0));
    assert_eq!(body["usage"]["support"]["overage_cost_cents"], 25_000);
    assert_eq!(body["usage"]["projected_total_cents"], 99_900 + 25_000);
}

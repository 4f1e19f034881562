//! Test fixtures: organizations, plans and assignments seeded through the repositories.

use chrono::Utc;
use opsportal_core::models::{
    NewPlan, NewPlanAssignment, NewTimeEntry, Plan, PlanAssignment, PlanAssignmentStatus, WorkType,
};
use opsportal_db::{
    OrganizationRepository, PlanAssignmentRepository, PlanRepository, TimeEntryRepository,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct SeededAssignment {
    pub organization_id: Uuid,
    pub plan: Plan,
    pub assignment: PlanAssignment,
}

/// Organization on a plan with 10 support and 5 dev hours included.
pub async fn seed_assignment(
    pool: &sqlx::PgPool,
    status: PlanAssignmentStatus,
) -> SeededAssignment {
    let organization = OrganizationRepository::new(pool.clone())
        .create("Acme Hosting")
        .await
        .expect("Failed to create organization");

    let plan = PlanRepository::new(pool.clone())
        .create(&NewPlan {
            name: "Starter".to_string(),
            description: Some("Managed hosting with support".to_string()),
            support_hours_included: Decimal::from(10),
            dev_hours_included: Decimal::from(5),
            support_overage_rate_cents: 12_500,
            dev_overage_rate_cents: 15_000,
            monthly_fee_cents: 99_900,
        })
        .await
        .expect("Failed to create plan");

    let assignment = PlanAssignmentRepository::new(pool.clone())
        .create(&NewPlanAssignment {
            organization_id: organization.id,
            plan_id: plan.id,
            status,
            billing_cycle_day: 1,
            next_billing_date: None,
            auto_renew: true,
        })
        .await
        .expect("Failed to create plan assignment");

    SeededAssignment {
        organization_id: organization.id,
        plan,
        assignment,
    }
}

/// Record hours directly, bypassing the API.
pub async fn seed_hours(
    pool: &sqlx::PgPool,
    seeded: &SeededAssignment,
    hours: Decimal,
    work_type: WorkType,
) {
    TimeEntryRepository::new(pool.clone())
        .insert(&NewTimeEntry {
            plan_assignment_id: seeded.assignment.id,
            organization_id: seeded.organization_id,
            ticket_id: None,
            description: "Seeded work".to_string(),
            hours,
            work_type,
            billable: true,
            entry_date: Utc::now().date_naive(),
            created_by: Uuid::new_v4(),
        })
        .await
        .expect("Failed to seed time entry");
}

/// Rows in `time_entries` for an assignment.
pub async fn count_time_entries(pool: &sqlx::PgPool, assignment_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM time_entries WHERE plan_assignment_id = $1")
        .bind(assignment_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count time entries")
}

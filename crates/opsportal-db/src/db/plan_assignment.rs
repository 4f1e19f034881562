use opsportal_core::{
    models::{HoursUsed, NewPlanAssignment, Plan, PlanAssignment},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::PlanRepository;

const ASSIGNMENT_COLUMNS: &str = "id, organization_id, plan_id, status, support_hours_used, \
    dev_hours_used, billing_cycle_day, next_billing_date, auto_renew, usage_period_start, \
    created_at, updated_at";

/// A plan assignment together with the plan it binds
#[derive(Debug, Clone)]
pub struct AssignmentWithPlan {
    pub assignment: PlanAssignment,
    pub plan: Plan,
}

/// Repository for plan assignments and their stored usage aggregates
#[derive(Clone)]
pub struct PlanAssignmentRepository {
    pool: PgPool,
    plans: PlanRepository,
}

impl PlanAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            plans: PlanRepository::new(pool.clone()),
            pool,
        }
    }

    #[tracing::instrument(skip(self, new), fields(db.table = "plan_assignments", db.operation = "insert", organization_id = %new.organization_id))]
    pub async fn create(&self, new: &NewPlanAssignment) -> Result<PlanAssignment, AppError> {
        let query = format!(
            r#"
            INSERT INTO plan_assignments (
                organization_id, plan_id, status, billing_cycle_day, next_billing_date, auto_renew
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        );
        let assignment = sqlx::query_as::<Postgres, PlanAssignment>(&query)
            .bind(new.organization_id)
            .bind(new.plan_id)
            .bind(new.status)
            .bind(new.billing_cycle_day)
            .bind(new.next_billing_date)
            .bind(new.auto_renew)
            .fetch_one(&self.pool)
            .await?;

        Ok(assignment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "plan_assignments", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<PlanAssignment>, AppError> {
        let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments WHERE id = $1");
        let assignment = sqlx::query_as::<Postgres, PlanAssignment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(assignment)
    }

    /// Load an assignment and its plan. `None` when the assignment does not exist.
    #[tracing::instrument(
        skip(self),
        fields(db.table = "plan_assignments", db.operation = "select", db.record_id = %id)
    )]
    pub async fn get_with_plan(&self, id: Uuid) -> Result<Option<AssignmentWithPlan>, AppError> {
        let Some(assignment) = self.get(id).await? else {
            return Ok(None);
        };

        let plan = self.plans.get(assignment.plan_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "Plan {} referenced by assignment {} is missing",
                assignment.plan_id, assignment.id
            ))
        })?;

        Ok(Some(AssignmentWithPlan { assignment, plan }))
    }

    #[tracing::instrument(skip(self), fields(db.table = "plan_assignments", db.operation = "select"))]
    pub async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<PlanAssignment>, AppError> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments WHERE organization_id = $1 ORDER BY created_at DESC"
        );
        let assignments = sqlx::query_as::<Postgres, PlanAssignment>(&query)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(assignments)
    }

    /// Recompute and store the usage aggregate via `calculate_plan_hours_used`.
    ///
    /// The insert trigger already does this; calling it again returns the stored
    /// totals as the database sees them after the write.
    #[tracing::instrument(skip(self), fields(db.table = "plan_assignments", db.operation = "update", db.record_id = %id))]
    pub async fn recalculate_usage(&self, id: Uuid) -> Result<HoursUsed, AppError> {
        let hours = sqlx::query_as::<Postgres, HoursUsed>(
            r#"
            SELECT total_support_hours AS support_hours_used, total_dev_hours AS dev_hours_used
            FROM calculate_plan_hours_used($1)
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        hours.ok_or_else(|| AppError::NotFound(format!("Plan assignment {} not found", id)))
    }
}

use opsportal_core::{
    models::{NewPlan, Plan},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const PLAN_COLUMNS: &str = "id, name, description, support_hours_included, dev_hours_included, \
    support_overage_rate_cents, dev_overage_rate_cents, monthly_fee_cents, is_active, \
    created_at, updated_at";

/// Repository for billing plans
#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, plan), fields(db.table = "plans", db.operation = "insert", plan.name = %plan.name))]
    pub async fn create(&self, plan: &NewPlan) -> Result<Plan, AppError> {
        let query = format!(
            r#"
            INSERT INTO plans (
                name, description, support_hours_included, dev_hours_included,
                support_overage_rate_cents, dev_overage_rate_cents, monthly_fee_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PLAN_COLUMNS}
            "#
        );
        let plan = sqlx::query_as::<Postgres, Plan>(&query)
            .bind(&plan.name)
            .bind(&plan.description)
            .bind(plan.support_hours_included)
            .bind(plan.dev_hours_included)
            .bind(plan.support_overage_rate_cents)
            .bind(plan.dev_overage_rate_cents)
            .bind(plan.monthly_fee_cents)
            .fetch_one(&self.pool)
            .await?;

        Ok(plan)
    }

    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Plan>, AppError> {
        let query = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1");
        let plan = sqlx::query_as::<Postgres, Plan>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select"))]
    pub async fn list_active(&self) -> Result<Vec<Plan>, AppError> {
        let query = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE is_active ORDER BY name ASC");
        let plans = sqlx::query_as::<Postgres, Plan>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(plans)
    }
}

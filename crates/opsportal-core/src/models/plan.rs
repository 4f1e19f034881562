use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Billing template: included hour pools, overage rates and monthly fee.
///
/// Rates and fees are in cents. Hour pools are exact decimals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub support_hours_included: Decimal,
    #[schema(value_type = f64)]
    pub dev_hours_included: Decimal,
    pub support_overage_rate_cents: i64,
    pub dev_overage_rate_cents: i64,
    pub monthly_fee_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a plan
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub support_hours_included: Decimal,
    pub dev_hours_included: Decimal,
    pub support_overage_rate_cents: i64,
    pub dev_overage_rate_cents: i64,
    pub monthly_fee_cents: i64,
}

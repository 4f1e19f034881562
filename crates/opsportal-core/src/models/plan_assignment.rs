use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Subscription lifecycle status. Transitions are driven by billing jobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "plan_assignment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PlanAssignmentStatus {
    Pending,
    Active,
    Paused,
    GracePeriod,
    Cancelled,
    Expired,
}

impl PlanAssignmentStatus {
    /// Only active subscriptions and those in their grace period accept time entries.
    pub fn accepts_time_entries(self) -> bool {
        matches!(
            self,
            PlanAssignmentStatus::Active | PlanAssignmentStatus::GracePeriod
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanAssignmentStatus::Pending => "pending",
            PlanAssignmentStatus::Active => "active",
            PlanAssignmentStatus::Paused => "paused",
            PlanAssignmentStatus::GracePeriod => "grace_period",
            PlanAssignmentStatus::Cancelled => "cancelled",
            PlanAssignmentStatus::Expired => "expired",
        }
    }
}

impl Display for PlanAssignmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An organization's subscription to a plan, with its running hour usage.
///
/// `support_hours_used` and `dev_hours_used` are maintained by the database
/// (`calculate_plan_hours_used`), never computed in application memory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PlanAssignment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: Uuid,
    pub status: PlanAssignmentStatus,
    #[schema(value_type = f64)]
    pub support_hours_used: Decimal,
    #[schema(value_type = f64)]
    pub dev_hours_used: Decimal,
    pub billing_cycle_day: i32,
    pub next_billing_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub usage_period_start: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a plan assignment
#[derive(Debug, Clone)]
pub struct NewPlanAssignment {
    pub organization_id: Uuid,
    pub plan_id: Uuid,
    pub status: PlanAssignmentStatus,
    pub billing_cycle_day: i32,
    pub next_billing_date: Option<NaiveDate>,
    pub auto_renew: bool,
}

/// Authoritative usage totals read back from the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct HoursUsed {
    pub support_hours_used: Decimal,
    pub dev_hours_used: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billable_statuses() {
        assert!(PlanAssignmentStatus::Active.accepts_time_entries());
        assert!(PlanAssignmentStatus::GracePeriod.accepts_time_entries());
        for status in [
            PlanAssignmentStatus::Pending,
            PlanAssignmentStatus::Paused,
            PlanAssignmentStatus::Cancelled,
            PlanAssignmentStatus::Expired,
        ] {
            assert!(!status.accepts_time_entries(), "{status} should be rejected");
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PlanAssignmentStatus::GracePeriod).unwrap();
        assert_eq!(json, "\"grace_period\"");
        assert_eq!(PlanAssignmentStatus::GracePeriod.to_string(), "grace_period");
    }
}

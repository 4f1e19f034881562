//! Hour-pool accounting
//!
//! Pure arithmetic over a plan's included hours and an assignment's used hours.
//! The projection made before a time entry is written is advisory: it is taken
//! from a usage snapshot and reserves nothing, so concurrent writers may each see
//! a stale `current_used`. The stored aggregate recomputed by the database after
//! the insert is authoritative.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Plan, PlanAssignment, WorkType};

/// Outcome of adding `new_hours` to a pool, computed before the write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageProjection {
    pub will_exceed: bool,
    pub overage_hours: Decimal,
}

/// `will_exceed = current_used + new_hours > included`,
/// `overage_hours = max(0, current_used + new_hours - included)`.
pub fn project_usage(
    current_used: Decimal,
    new_hours: Decimal,
    included: Decimal,
) -> UsageProjection {
    let projected = current_used + new_hours;
    UsageProjection {
        will_exceed: projected > included,
        overage_hours: (projected - included).max(Decimal::ZERO),
    }
}

/// Hours left in a pool; zero once the pool is exhausted.
pub fn remaining_hours(included: Decimal, used: Decimal) -> Decimal {
    (included - used).max(Decimal::ZERO)
}

/// Hours used beyond the pool.
pub fn overage_hours(included: Decimal, used: Decimal) -> Decimal {
    (used - included).max(Decimal::ZERO)
}

/// Overage charge in cents, rounded up to the next whole cent.
pub fn overage_cost_cents(overage_hours: Decimal, rate_cents: i64) -> i64 {
    if overage_hours <= Decimal::ZERO || rate_cents <= 0 {
        return 0;
    }
    (overage_hours * Decimal::from(rate_cents))
        .ceil()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// One hour pool of an assignment: what the plan includes and what has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourPool {
    pub work_type: WorkType,
    pub included: Decimal,
    pub used: Decimal,
    pub overage_rate_cents: i64,
}

impl HourPool {
    pub fn for_work_type(plan: &Plan, assignment: &PlanAssignment, work_type: WorkType) -> Self {
        match work_type {
            WorkType::Support => HourPool {
                work_type,
                included: plan.support_hours_included,
                used: assignment.support_hours_used,
                overage_rate_cents: plan.support_overage_rate_cents,
            },
            WorkType::Dev => HourPool {
                work_type,
                included: plan.dev_hours_included,
                used: assignment.dev_hours_used,
                overage_rate_cents: plan.dev_overage_rate_cents,
            },
        }
    }

    pub fn project(&self, new_hours: Decimal) -> UsageProjection {
        project_usage(self.used, new_hours, self.included)
    }

    pub fn remaining(&self) -> Decimal {
        remaining_hours(self.included, self.used)
    }

    pub fn summary(&self) -> PoolSummary {
        let overage = overage_hours(self.included, self.used);
        PoolSummary {
            included: self.included,
            used: self.used,
            remaining: self.remaining(),
            overage_hours: overage,
            overage_cost_cents: overage_cost_cents(overage, self.overage_rate_cents),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolSummary {
    #[schema(value_type = f64)]
    pub included: Decimal,
    #[schema(value_type = f64)]
    pub used: Decimal,
    #[schema(value_type = f64)]
    pub remaining: Decimal,
    #[schema(value_type = f64)]
    pub overage_hours: Decimal,
    pub overage_cost_cents: i64,
}

/// Both pools of an assignment plus the projected invoice total for the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    pub support: PoolSummary,
    pub dev: PoolSummary,
    pub monthly_fee_cents: i64,
    pub projected_total_cents: i64,
}

impl UsageSummary {
    pub fn from_assignment(plan: &Plan, assignment: &PlanAssignment) -> Self {
        let support = HourPool::for_work_type(plan, assignment, WorkType::Support).summary();
        let dev = HourPool::for_work_type(plan, assignment, WorkType::Dev).summary();
        UsageSummary {
            support,
            dev,
            monthly_fee_cents: plan.monthly_fee_cents,
            projected_total_cents: plan
                .monthly_fee_cents
                .saturating_add(support.overage_cost_cents)
                .saturating_add(dev.overage_cost_cents),
        }
    }
}

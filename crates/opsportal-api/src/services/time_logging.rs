//! Time logging against plan assignments
//!
//! `log_time` never blocks on the hour pool: exceeding it is reported back to the
//! caller as `will_exceed_limit` / `overage_hours` and billed as overage later.
//! Those two values come from the usage snapshot read before the insert, so under
//! concurrent writers they can understate the overage. The used/remaining figures
//! in the response come from the database after the insert and are authoritative.

use std::sync::Arc;

use opsportal_core::models::{
    Actor, LogTimeRequest, LogTimeResponse, Plan, PlanAssignment, TimeEntry,
    TimeEntryListResponse, TimeEntryQuery,
};
use opsportal_core::usage::{remaining_hours, HourPool, UsageSummary};
use opsportal_core::AppError;
use opsportal_db::{AssignmentWithPlan, NewAuditLog, PlanUsageStore};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::audit::{self, AuditEventType, AuditLogEntry};

/// Assignment detail with its plan and current usage
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignmentUsageResponse {
    pub assignment: PlanAssignment,
    pub plan: Plan,
    pub usage: UsageSummary,
}

#[derive(Clone)]
pub struct TimeLoggingService {
    store: Arc<dyn PlanUsageStore>,
}

impl TimeLoggingService {
    pub fn new(store: Arc<dyn PlanUsageStore>) -> Self {
        Self { store }
    }

    async fn load_assignment(&self, assignment_id: Uuid) -> Result<AssignmentWithPlan, AppError> {
        self.store
            .assignment_with_plan(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Plan assignment {} not found", assignment_id))
            })
    }

    /// Load an assignment the actor may see. Assignments of other organizations
    /// are reported as missing.
    async fn load_visible_assignment(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
    ) -> Result<AssignmentWithPlan, AppError> {
        let loaded = self.load_assignment(assignment_id).await?;
        if !actor.can_view_assignment(&loaded.assignment) {
            audit::log_access_denied(
                actor,
                assignment_id,
                "assignment belongs to another organization",
            );
            return Err(AppError::NotFound(format!(
                "Plan assignment {} not found",
                assignment_id
            )));
        }
        Ok(loaded)
    }

    /// Record hours against an assignment and report the resulting usage.
    #[tracing::instrument(
        skip(self, actor, request),
        fields(
            user_id = %actor.user_id,
            role = %actor.role,
            work_type = %request.work_type,
            hours = %request.hours
        )
    )]
    pub async fn log_time(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        request: LogTimeRequest,
    ) -> Result<LogTimeResponse, AppError> {
        if !actor.can_log_time() {
            audit::log_access_denied(actor, assignment_id, "role cannot log time");
            return Err(AppError::Forbidden(
                "Only staff and admins can log time".to_string(),
            ));
        }

        request.validate()?;

        let AssignmentWithPlan { assignment, plan } = self.load_assignment(assignment_id).await?;

        if !assignment.status.accepts_time_entries() {
            return Err(AppError::AssignmentNotBillable {
                assignment_id,
                status: assignment.status.to_string(),
            });
        }

        let entry =
            request.into_new_entry(assignment.id, assignment.organization_id, actor.user_id)?;

        let pool = HourPool::for_work_type(&plan, &assignment, entry.work_type);
        let projection = pool.project(entry.hours);

        let created = self.store.insert_time_entry(&entry).await?;
        let usage = self.store.current_usage(assignment.id).await?;

        if projection.will_exceed {
            tracing::warn!(
                plan_assignment_id = %assignment.id,
                organization_id = %assignment.organization_id,
                work_type = %entry.work_type,
                included = %pool.included,
                used_before = %pool.used,
                overage_hours = %projection.overage_hours,
                "Time entry exceeds included hours"
            );
        }

        tracing::info!(
            time_entry_id = %created.id,
            plan_assignment_id = %assignment.id,
            support_hours_used = %usage.support_hours_used,
            dev_hours_used = %usage.dev_hours_used,
            "Time entry logged"
        );

        self.record_logged(
            actor,
            &assignment,
            &created,
            projection.will_exceed,
            projection.overage_hours,
        );

        Ok(LogTimeResponse {
            support_hours_used: usage.support_hours_used,
            dev_hours_used: usage.dev_hours_used,
            support_hours_remaining: remaining_hours(
                plan.support_hours_included,
                usage.support_hours_used,
            ),
            dev_hours_remaining: remaining_hours(plan.dev_hours_included, usage.dev_hours_used),
            will_exceed_limit: projection.will_exceed,
            overage_hours: projection.overage_hours,
            entry: created,
        })
    }

    /// Persist the audit record without holding up the response.
    fn record_logged(
        &self,
        actor: &Actor,
        assignment: &PlanAssignment,
        entry: &TimeEntry,
        will_exceed: bool,
        overage_hours: Decimal,
    ) {
        let details = serde_json::json!({
            "plan_assignment_id": assignment.id,
            "hours": entry.hours,
            "work_type": entry.work_type,
            "billable": entry.billable,
            "entry_date": entry.entry_date,
            "will_exceed_limit": will_exceed,
            "overage_hours": overage_hours,
        });

        AuditLogEntry::new(AuditEventType::TimeEntryLogged)
            .with_actor(actor)
            .with_organization_id(assignment.organization_id)
            .with_resource_id(entry.id)
            .with_details(details.clone())
            .log();

        let record = NewAuditLog {
            event_type: AuditEventType::TimeEntryLogged.as_str().to_string(),
            actor_id: Some(actor.user_id),
            organization_id: Some(assignment.organization_id),
            resource_type: "time_entry".to_string(),
            resource_id: Some(entry.id),
            details,
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_audit(record).await {
                tracing::warn!(error = %e, "Failed to persist audit record");
            }
        });
    }

    /// Page through an assignment's entries
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id, role = %actor.role))]
    pub async fn list_time(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        query: TimeEntryQuery,
    ) -> Result<TimeEntryListResponse, AppError> {
        let filter = query.to_filter()?;
        let AssignmentWithPlan { assignment, .. } =
            self.load_visible_assignment(actor, assignment_id).await?;

        let (entries, total) = self.store.list_time_entries(assignment.id, &filter).await?;

        Ok(TimeEntryListResponse {
            entries,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    /// Assignment, plan and usage of both hour pools
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id, role = %actor.role))]
    pub async fn usage_summary(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
    ) -> Result<AssignmentUsageResponse, AppError> {
        let AssignmentWithPlan { assignment, plan } =
            self.load_visible_assignment(actor, assignment_id).await?;
        let usage = UsageSummary::from_assignment(&plan, &assignment);
        Ok(AssignmentUsageResponse {
            assignment,
            plan,
            usage,
        })
    }
}

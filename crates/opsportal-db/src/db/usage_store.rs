//! Storage seam for the time logging service
//!
//! The service depends on [`PlanUsageStore`] rather than on the repositories so
//! its flow can be exercised without PostgreSQL.

use async_trait::async_trait;
use opsportal_core::models::{HoursUsed, NewTimeEntry, TimeEntry, TimeEntryFilter};
use opsportal_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use super::plan_assignment::AssignmentWithPlan;
use super::{AuditLogRepository, NewAuditLog, PlanAssignmentRepository, TimeEntryRepository};

#[async_trait]
pub trait PlanUsageStore: Send + Sync {
    /// Assignment snapshot plus its plan
    async fn assignment_with_plan(&self, id: Uuid) -> Result<Option<AssignmentWithPlan>, AppError>;

    /// Persist an entry; the stored usage aggregate is refreshed by the database
    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, AppError>;

    /// Authoritative usage totals after the last write
    async fn current_usage(&self, assignment_id: Uuid) -> Result<HoursUsed, AppError>;

    /// One page of entries plus the total matching the filter
    async fn list_time_entries(
        &self,
        assignment_id: Uuid,
        filter: &TimeEntryFilter,
    ) -> Result<(Vec<TimeEntry>, i64), AppError>;

    async fn record_audit(&self, entry: NewAuditLog) -> Result<(), AppError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgPlanUsageStore {
    assignments: PlanAssignmentRepository,
    entries: TimeEntryRepository,
    audit: AuditLogRepository,
}

impl PgPlanUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            assignments: PlanAssignmentRepository::new(pool.clone()),
            entries: TimeEntryRepository::new(pool.clone()),
            audit: AuditLogRepository::new(pool),
        }
    }
}

#[async_trait]
impl PlanUsageStore for PgPlanUsageStore {
    async fn assignment_with_plan(&self, id: Uuid) -> Result<Option<AssignmentWithPlan>, AppError> {
        self.assignments.get_with_plan(id).await
    }

    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, AppError> {
        self.entries.insert(entry).await
    }

    async fn current_usage(&self, assignment_id: Uuid) -> Result<HoursUsed, AppError> {
        self.assignments.recalculate_usage(assignment_id).await
    }

    async fn list_time_entries(
        &self,
        assignment_id: Uuid,
        filter: &TimeEntryFilter,
    ) -> Result<(Vec<TimeEntry>, i64), AppError> {
        let entries = self.entries.list(assignment_id, filter).await?;
        let total = self.entries.count(assignment_id, filter).await?;
        Ok((entries, total))
    }

    async fn record_audit(&self, entry: NewAuditLog) -> Result<(), AppError> {
        self.audit.insert(&entry).await
    }
}

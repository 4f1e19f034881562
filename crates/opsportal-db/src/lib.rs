//! Opsportal Database Layer
//!
//! Repositories over PostgreSQL for organizations, plans, plan assignments,
//! time entries and audit records, plus the `PlanUsageStore` seam used by the
//! time logging service.
//!
// Module declarations
pub mod db;

// Re-exports: repositories
pub use db::{
    AuditLogRepository, NewAuditLog, OrganizationRepository, PlanAssignmentRepository,
    PlanRepository, TimeEntryRepository,
};

// Re-exports: usage store seam
pub use db::plan_assignment::AssignmentWithPlan;
pub use db::usage_store::{PgPlanUsageStore, PlanUsageStore};

/// Embedded SQL migrations from the workspace `migrations/` directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

//! Database repositories for data access layer
//!
//! Each repository owns one table and scopes reads by organization where the
//! caller supplies one.

pub mod audit_log;
pub mod organization;
pub mod plan;
pub mod plan_assignment;
pub mod time_entry;
pub mod usage_store;

pub use audit_log::{AuditLogRepository, NewAuditLog};
pub use organization::OrganizationRepository;
pub use plan::PlanRepository;
pub use plan_assignment::PlanAssignmentRepository;
pub use time_entry::TimeEntryRepository;

//! Data models for the application
//!
//! Organized by domain: organizations own plan assignments, plan assignments
//! bind an organization to a plan, and time entries consume the plan's hour pools.

mod organization;
mod plan;
mod plan_assignment;
mod role;
mod time_entry;

// Re-export all models for convenient imports
pub use organization::*;
pub use plan::*;
pub use plan_assignment::*;
pub use role::*;
pub use time_entry::*;

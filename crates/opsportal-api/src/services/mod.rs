//! Business services used by the HTTP handlers

pub mod time_logging;

pub use time_logging::{AssignmentUsageResponse, TimeLoggingService};

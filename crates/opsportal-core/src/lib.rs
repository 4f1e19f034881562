//! Opsportal Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! hour-pool accounting rules shared by the database and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod usage;

// Re-export commonly used types
pub use config::{BaseConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use usage::{HourPool, PoolSummary, UsageProjection, UsageSummary};

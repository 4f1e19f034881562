//! Opsportal API Library
//!
//! HTTP handlers, authentication, middleware and application setup for the
//! plan-assignment hour accounting service.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::TimeLoggingService;

//! Application errors
//!
//! Every failure the service can report is an [`AppError`] variant. How a variant
//! is shown to HTTP clients (status, code, retry hint, redaction, log level) is
//! described by [`ErrorMetadata`] so the API crate can render it without matching
//! on variants itself.
//!
//! `AppError::Database` wraps `sqlx::Error` only when the `sqlx` feature is on.

use std::collections::BTreeMap;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Level an error is logged at when it reaches the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: bad input, unknown ids, missing credentials
    Debug,
    /// Refused operations worth noticing
    Warn,
    /// Failures on our side
    Error,
}

/// Client-facing presentation of an error
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code, e.g. `ASSIGNMENT_NOT_BILLABLE`
    fn error_code(&self) -> &'static str;

    /// Retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to the caller
    fn client_message(&self) -> String;

    /// Internal details must never leave the process
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

/// Field name -> list of messages, ordered for stable responses.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Plan assignment {assignment_id} is {status} and cannot accept time entries")]
    AssignmentNotBillable {
        assignment_id: uuid::Uuid,
        status: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        AppError::Validation {
            message: VALIDATION_MESSAGE.to_string(),
            fields,
        }
    }
}

const VALIDATION_MESSAGE: &str = "Request validation failed";
const RETRY_LATER: &str = "Retry after a short delay";

/// Presentation row shared by the `ErrorMetadata` accessors
struct Presentation {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

impl Presentation {
    const fn client(status: u16, code: &'static str, action: &'static str) -> Self {
        Presentation {
            status,
            code,
            recoverable: false,
            action: Some(action),
            sensitive: false,
            level: LogLevel::Debug,
        }
    }

    const fn refused(status: u16, code: &'static str, action: &'static str) -> Self {
        Presentation {
            level: LogLevel::Warn,
            ..Presentation::client(status, code, action)
        }
    }

    const fn server(code: &'static str) -> Self {
        Presentation {
            status: 500,
            code,
            recoverable: true,
            action: Some(RETRY_LATER),
            sensitive: true,
            level: LogLevel::Error,
        }
    }
}

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::Database(_) => Presentation::server("DATABASE_ERROR"),
            AppError::Validation { .. } => Presentation::client(
                400,
                "VALIDATION_FAILED",
                "Fix the listed fields and try again",
            ),
            AppError::InvalidInput(_) => Presentation::client(
                400,
                "INVALID_INPUT",
                "Check the request body and query string",
            ),
            AppError::BadRequest(_) => {
                Presentation::client(400, "BAD_REQUEST", "Check the request format")
            }
            AppError::NotFound(_) => {
                Presentation::client(404, "NOT_FOUND", "Check the plan assignment ID")
            }
            AppError::Unauthorized(_) => {
                Presentation::client(401, "UNAUTHORIZED", "Send a valid bearer token")
            }
            AppError::Forbidden(_) => Presentation::refused(
                403,
                "FORBIDDEN",
                "Ask an administrator for the required role",
            ),
            AppError::AssignmentNotBillable { .. } => Presentation::refused(
                409,
                "ASSIGNMENT_NOT_BILLABLE",
                "Reactivate the plan assignment before logging time",
            ),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                Presentation::server("INTERNAL_ERROR")
            }
        }
    }

    /// Variant name, shown outside production
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation { .. } => "Validation",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::AssignmentNotBillable { .. } => "AssignmentNotBillable",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Field-level errors, present only for validation failures
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        AppError::Validation {
            message: VALIDATION_MESSAGE.to_string(),
            fields,
        }
    }

    /// Display text followed by up to five causes
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let mut causes = std::iter::successors(self.source(), |&err| err.source());
        for cause in causes.by_ref().take(5) {
            details.push_str(&format!("\n  caused by: {}", cause));
        }
        if causes.next().is_some() {
            details.push_str("\n  ...");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().action
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database unavailable".to_string(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg) => msg.clone(),
            AppError::AssignmentNotBillable { status, .. } => format!(
                "Time can only be logged against active or grace_period assignments (current status: {})",
                status
            ),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_database_errors_are_redacted() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Database unavailable");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_lists_causes() {
        let err = AppError::from(anyhow::anyhow!("socket closed").context("insert failed"));
        let details = err.detailed_message();
        assert!(details.starts_with("Internal error: insert failed"));
        assert!(details.contains("caused by: socket closed"));
    }

    #[test]
    fn test_error_metadata_forbidden() {
        let err = AppError::Forbidden("Only staff can log time".to_string());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Only staff can log time");
    }

    #[test]
    fn test_error_metadata_assignment_not_billable() {
        let err = AppError::AssignmentNotBillable {
            assignment_id: uuid::Uuid::nil(),
            status: "cancelled".to_string(),
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "ASSIGNMENT_NOT_BILLABLE");
        assert!(err.client_message().contains("cancelled"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_keep_field_names() {
        let errors = Probe {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let err = AppError::from(errors);
        assert_eq!(err.http_status_code(), 400);
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields["name"], vec!["must not be empty".to_string()]);
    }

    #[test]
    fn test_single_field_helper() {
        let err = AppError::field("to", "must not be before from");
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(err.field_errors().unwrap().contains_key("to"));
    }
}

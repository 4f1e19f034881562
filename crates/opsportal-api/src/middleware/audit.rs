//! Security and activity audit logging
//!
//! Entries are emitted as structured `tracing` events with the `audit` target.
//! Business events that must be kept (time entries) are additionally persisted by
//! the service through the audit repository.

use opsportal_core::models::Actor;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    RateLimitExceeded,
    AccessDenied,
    TimeEntryLogged,
}

impl AuditEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEventType::AuthenticationSuccess => "authentication_success",
            AuditEventType::AuthenticationFailure => "authentication_failure",
            AuditEventType::RateLimitExceeded => "rate_limit_exceeded",
            AuditEventType::AccessDenied => "access_denied",
            AuditEventType::TimeEntryLogged => "time_entry_logged",
        }
    }
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            organization_id: None,
            user_id: None,
            role: None,
            client_ip: None,
            user_agent: None,
            resource_id: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_actor(mut self, actor: &Actor) -> Self {
        self.user_id = Some(actor.user_id);
        self.organization_id = actor.organization_id;
        self.role = Some(actor.role.to_string());
        self
    }

    pub fn with_organization_id(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn with_client_ip(mut self, client_ip: String) -> Self {
        self.client_ip = Some(client_ip);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn with_resource_id(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_failure(mut self, error_message: String) -> Self {
        self.success = false;
        self.error_message = Some(error_message);
        self
    }

    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = self.event_type.as_str(),
                organization_id = ?self.organization_id,
                user_id = ?self.user_id,
                success = self.success,
                "Audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = self.event_type.as_str(),
                organization_id = ?self.organization_id,
                user_id = ?self.user_id,
                success = self.success,
                error = ?self.error_message,
                "Audit log - failure"
            );
        }
    }
}

pub fn log_authentication_attempt(
    actor: Option<&Actor>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    success: bool,
    error_message: Option<String>,
) {
    let event_type = if success {
        AuditEventType::AuthenticationSuccess
    } else {
        AuditEventType::AuthenticationFailure
    };
    let mut entry = AuditLogEntry::new(event_type);
    if let Some(actor) = actor {
        entry = entry.with_actor(actor);
    }
    if let Some(ip) = client_ip {
        entry = entry.with_client_ip(ip);
    }
    if let Some(ua) = user_agent {
        entry = entry.with_user_agent(ua);
    }
    if let Some(message) = error_message {
        entry = entry.with_failure(message);
    }
    entry.log();
}

pub fn log_rate_limit_exceeded(client_ip: &str) {
    AuditLogEntry::new(AuditEventType::RateLimitExceeded)
        .with_client_ip(client_ip.to_string())
        .with_failure("Too many failed auth attempts".to_string())
        .log();
}

pub fn log_access_denied(actor: &Actor, resource_id: Uuid, reason: &str) {
    AuditLogEntry::new(AuditEventType::AccessDenied)
        .with_actor(actor)
        .with_resource_id(resource_id)
        .with_failure(reason.to_string())
        .log();
}

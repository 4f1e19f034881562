use opsportal_core::AppError;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Audit record to persist
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub event_type: String,
    pub actor_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub details: JsonValue,
}

/// Append-only audit trail
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, entry), fields(db.table = "audit_logs", db.operation = "insert", event_type = %entry.event_type))]
    pub async fn insert(&self, entry: &NewAuditLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (event_type, actor_id, organization_id, resource_type, resource_id, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&entry.event_type)
        .bind(entry.actor_id)
        .bind(entry.organization_id)
        .bind(&entry.resource_type)
        .bind(entry.resource_id)
        .bind(&entry.details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

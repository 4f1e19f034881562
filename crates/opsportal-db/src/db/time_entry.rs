use opsportal_core::{
    models::{NewTimeEntry, TimeEntry, TimeEntryFilter},
    AppError,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const ENTRY_COLUMNS: &str = "id, plan_assignment_id, organization_id, ticket_id, description, \
    hours, work_type, billable, entry_date, created_by, created_at";

/// Repository for time entries. Entries are append-only.
#[derive(Clone)]
pub struct TimeEntryRepository {
    pool: PgPool,
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    plan_assignment_id: Uuid,
    filter: &TimeEntryFilter,
) {
    builder.push(" WHERE plan_assignment_id = ");
    builder.push_bind(plan_assignment_id);
    if let Some(work_type) = filter.work_type {
        builder.push(" AND work_type = ");
        builder.push_bind(work_type);
    }
    if let Some(billable) = filter.billable {
        builder.push(" AND billable = ");
        builder.push_bind(billable);
    }
    if let Some(from) = filter.from {
        builder.push(" AND entry_date >= ");
        builder.push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND entry_date <= ");
        builder.push_bind(to);
    }
}

impl TimeEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an entry. The `time_entries` trigger refreshes the assignment's usage.
    #[tracing::instrument(
        skip(self, entry),
        fields(
            db.table = "time_entries",
            db.operation = "insert",
            plan_assignment_id = %entry.plan_assignment_id,
            work_type = %entry.work_type,
            hours = %entry.hours
        )
    )]
    pub async fn insert(&self, entry: &NewTimeEntry) -> Result<TimeEntry, AppError> {
        let query = format!(
            r#"
            INSERT INTO time_entries (
                plan_assignment_id, organization_id, ticket_id, description, hours,
                work_type, billable, entry_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<Postgres, TimeEntry>(&query)
            .bind(entry.plan_assignment_id)
            .bind(entry.organization_id)
            .bind(entry.ticket_id)
            .bind(&entry.description)
            .bind(entry.hours)
            .bind(entry.work_type)
            .bind(entry.billable)
            .bind(entry.entry_date)
            .bind(entry.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    /// Page of entries, newest entry_date first
    #[tracing::instrument(skip(self), fields(db.table = "time_entries", db.operation = "select"))]
    pub async fn list(
        &self,
        plan_assignment_id: Uuid,
        filter: &TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, AppError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {ENTRY_COLUMNS} FROM time_entries"));
        push_filters(&mut builder, plan_assignment_id, filter);
        builder.push(" ORDER BY entry_date DESC, created_at DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let entries = builder
            .build_query_as::<TimeEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    #[tracing::instrument(skip(self), fields(db.table = "time_entries", db.operation = "select"))]
    pub async fn count(
        &self,
        plan_assignment_id: Uuid,
        filter: &TimeEntryFilter,
    ) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM time_entries");
        push_filters(&mut builder, plan_assignment_id, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }
}

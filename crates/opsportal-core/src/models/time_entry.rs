use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::constants::{
    DEFAULT_PAGE_SIZE, HOURS_SCALE, MAX_DESCRIPTION_LENGTH, MAX_HOURS_PER_ENTRY, MAX_PAGE_SIZE,
};
use crate::error::AppError;

/// Which hour pool an entry consumes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "work_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Support,
    Dev,
}

impl Display for WorkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WorkType::Support => write!(f, "support"),
            WorkType::Dev => write!(f, "dev"),
        }
    }
}

/// A logged unit of work against a plan assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TimeEntry {
    pub id: Uuid,
    pub plan_assignment_id: Uuid,
    pub organization_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub description: String,
    #[schema(value_type = f64)]
    pub hours: Decimal,
    pub work_type: WorkType,
    pub billable: bool,
    pub entry_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; built by the logging service from a validated request
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub plan_assignment_id: Uuid,
    pub organization_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub description: String,
    pub hours: Decimal,
    pub work_type: WorkType,
    pub billable: bool,
    pub entry_date: NaiveDate,
    pub created_by: Uuid,
}

fn default_billable() -> bool {
    true
}

/// Body of `POST /api/plan-assignments/{id}/time`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LogTimeRequest {
    #[validate(custom(function = "validate_description"))]
    #[schema(example = "Investigated failing invoice export")]
    pub description: String,

    #[validate(custom(function = "validate_hours"))]
    #[schema(value_type = f64, example = 1.5)]
    pub hours: Decimal,

    /// Defaults to today (UTC)
    #[validate(custom(function = "validate_entry_date"))]
    pub entry_date: Option<NaiveDate>,

    pub work_type: WorkType,

    pub ticket_id: Option<Uuid>,

    #[serde(default = "default_billable")]
    pub billable: bool,
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(validation_error("required", "Description is required"));
    }
    if trimmed.chars().count() as u64 > MAX_DESCRIPTION_LENGTH {
        return Err(validation_error(
            "length",
            "Description must be at most 2000 characters",
        ));
    }
    Ok(())
}

fn validate_hours(hours: &Decimal) -> Result<(), ValidationError> {
    if *hours <= Decimal::ZERO {
        return Err(validation_error("range", "Hours must be greater than 0"));
    }
    if *hours > Decimal::from(MAX_HOURS_PER_ENTRY) {
        return Err(validation_error("range", "Hours must be at most 24"));
    }
    if hours.normalize().scale() > HOURS_SCALE {
        return Err(validation_error(
            "precision",
            "Hours support at most two decimal places",
        ));
    }
    Ok(())
}

fn validate_entry_date(date: &NaiveDate) -> Result<(), ValidationError> {
    // One day of slack for callers ahead of UTC.
    let latest = Utc::now().date_naive() + Duration::days(1);
    if *date > latest {
        return Err(validation_error(
            "future_date",
            "Entry date cannot be in the future",
        ));
    }
    Ok(())
}

impl LogTimeRequest {
    /// Validate and convert into a row for insertion
    pub fn into_new_entry(
        self,
        plan_assignment_id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<NewTimeEntry, AppError> {
        self.validate()?;
        Ok(NewTimeEntry {
            plan_assignment_id,
            organization_id,
            ticket_id: self.ticket_id,
            description: self.description.trim().to_string(),
            hours: self.hours.normalize(),
            work_type: self.work_type,
            billable: self.billable,
            entry_date: self.entry_date.unwrap_or_else(|| Utc::now().date_naive()),
            created_by,
        })
    }
}

/// Query string of `GET /api/plan-assignments/{id}/time`
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimeEntryQuery {
    pub work_type: Option<WorkType>,
    pub billable: Option<bool>,
    /// Inclusive lower bound on entry_date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on entry_date
    pub to: Option<NaiveDate>,
    /// 1-based page number
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Normalized filter handed to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryFilter {
    pub work_type: Option<WorkType>,
    pub billable: Option<bool>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl TimeEntryQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn to_filter(&self) -> Result<TimeEntryFilter, AppError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::field("to", "Date range end must not be before start"));
            }
        }
        let per_page = self.per_page();
        Ok(TimeEntryFilter {
            work_type: self.work_type,
            billable: self.billable,
            from: self.from,
            to: self.to,
            limit: per_page,
            offset: (self.page() - 1).saturating_mul(per_page),
        })
    }
}

/// Response of `POST /api/plan-assignments/{id}/time`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogTimeResponse {
    pub entry: TimeEntry,
    #[schema(value_type = f64)]
    pub support_hours_used: Decimal,
    #[schema(value_type = f64)]
    pub dev_hours_used: Decimal,
    #[schema(value_type = f64)]
    pub support_hours_remaining: Decimal,
    #[schema(value_type = f64)]
    pub dev_hours_remaining: Decimal,
    /// Advisory: computed from the usage snapshot taken before the insert
    pub will_exceed_limit: bool,
    #[schema(value_type = f64)]
    pub overage_hours: Decimal,
}

/// Response of `GET /api/plan-assignments/{id}/time`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeEntryListResponse {
    pub entries: Vec<TimeEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

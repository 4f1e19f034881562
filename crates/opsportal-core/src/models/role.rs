use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::PlanAssignment;

/// User role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
    Client,
}

impl UserRole {
    /// Admins and staff work across every organization
    pub fn is_internal(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Staff => write!(f, "staff"),
            UserRole::Client => write!(f, "client"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            "client" => Ok(UserRole::Client),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    /// None for the service identity behind the master API key
    pub organization_id: Option<Uuid>,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, organization_id: Option<Uuid>, role: UserRole) -> Self {
        Self {
            user_id,
            organization_id,
            role,
        }
    }

    pub fn can_log_time(&self) -> bool {
        can_log_time(self.role)
    }

    pub fn can_view_assignment(&self, assignment: &PlanAssignment) -> bool {
        can_view_assignment(self, assignment)
    }
}

/// Only admins and staff record hours.
pub fn can_log_time(role: UserRole) -> bool {
    role.is_internal()
}

/// Clients only see their own organization's assignments.
pub fn can_view_assignment(actor: &Actor, assignment: &PlanAssignment) -> bool {
    actor.role.is_internal() || actor.organization_id == Some(assignment.organization_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanAssignmentStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn assignment_for(organization_id: Uuid) -> PlanAssignment {
        let now = Utc::now();
        PlanAssignment {
            id: Uuid::new_v4(),
            organization_id,
            plan_id: Uuid::new_v4(),
            status: PlanAssignmentStatus::Active,
            support_hours_used: Decimal::ZERO,
            dev_hours_used: Decimal::ZERO,
            billing_cycle_day: 1,
            next_billing_date: None,
            auto_renew: true,
            usage_period_start: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_internal_roles_log_time() {
        assert!(can_log_time(UserRole::Admin));
        assert!(can_log_time(UserRole::Staff));
        assert!(!can_log_time(UserRole::Client));
    }

    #[test]
    fn test_client_sees_only_own_organization() {
        let org = Uuid::new_v4();
        let assignment = assignment_for(org);

        let own = Actor::new(Uuid::new_v4(), Some(org), UserRole::Client);
        let other = Actor::new(Uuid::new_v4(), Some(Uuid::new_v4()), UserRole::Client);
        let staff = Actor::new(Uuid::new_v4(), Some(Uuid::new_v4()), UserRole::Staff);
        let service = Actor::new(Uuid::new_v4(), None, UserRole::Admin);

        assert!(own.can_view_assignment(&assignment));
        assert!(!other.can_view_assignment(&assignment));
        assert!(staff.can_view_assignment(&assignment));
        assert!(service.can_view_assignment(&assignment));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Staff".parse::<UserRole>().unwrap(), UserRole::Staff);
        assert!("viewer".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Client.to_string(), "client");
    }
}

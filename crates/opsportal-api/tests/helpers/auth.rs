use chrono::Utc;
use opsportal_api::auth::{JwtClaims, JwtService};
use opsportal_core::models::UserRole;
use uuid::Uuid;

/// Test master API key (must match setup_test_app).
pub const TEST_MASTER_API_KEY: &str = "test-master-api-key-at-least-32-characters-long";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// Test user with a signed bearer token
pub struct TestUser {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: UserRole,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Issue a one-hour token for a new user of `organization_id`.
pub fn test_user(organization_id: Uuid, role: UserRole) -> TestUser {
    let user_id = Uuid::new_v4();
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        organization_id,
        role: role.to_string(),
        exp: now + 3600,
        iat: now,
        nbf: None,
    };
    let token = JwtService::new(TEST_JWT_SECRET)
        .issue_token(&claims)
        .expect("Failed to sign test token");
    TestUser {
        user_id,
        organization_id,
        role,
        token,
    }
}

pub fn master_bearer() -> String {
    format!("Bearer {}", TEST_MASTER_API_KEY)
}

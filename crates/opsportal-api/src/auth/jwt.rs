//! HS256 bearer tokens issued by the portal's identity service

use crate::auth::models::JwtClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use opsportal_core::models::{Actor, UserRole};
use opsportal_core::AppError;

#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AppError::Unauthorized("Token is not yet valid (nbf)".to_string())
                    }
                    _ => AppError::Unauthorized("Invalid or expired token".to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Validate a token and resolve the caller it names
    pub fn authenticate(&self, token: &str) -> Result<Actor, AppError> {
        let claims = self.validate_token(token)?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| AppError::Unauthorized("Invalid user role".to_string()))?;
        Ok(Actor::new(claims.sub, Some(claims.organization_id), role))
    }

    /// Sign claims; used by service-to-service callers and tests
    pub fn issue_token(&self, claims: &JwtClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

    fn claims(role: &str, exp_offset: i64) -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            sub: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            role: role.to_string(),
            exp: now + exp_offset,
            iat: now,
            nbf: None,
        }
    }

    #[test]
    fn test_round_trip_resolves_actor() {
        let service = JwtService::new(SECRET);
        let claims = claims("staff", 3600);
        let token = service.issue_token(&claims).unwrap();
        let actor = service.authenticate(&token).unwrap();
        assert_eq!(actor.user_id, claims.sub);
        assert_eq!(actor.organization_id, Some(claims.organization_id));
        assert_eq!(actor.role, UserRole::Staff);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(SECRET);
        let token = service.issue_token(&claims("admin", -60)).unwrap();
        let err = service.authenticate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("expired")));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("another-secret-that-is-at-least-32-characters");
        let token = issuer.issue_token(&claims("admin", 3600)).unwrap();
        assert!(JwtService::new(SECRET).authenticate(&token).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let service = JwtService::new(SECRET);
        let token = service.issue_token(&claims("superuser", 3600)).unwrap();
        let err = service.authenticate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid user role"));
    }
}

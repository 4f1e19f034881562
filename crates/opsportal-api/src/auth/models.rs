use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use opsportal_core::models::Actor;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    pub organization_id: Uuid,
    pub role: String, // "admin", "staff" or "client"
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Authenticated caller, placed in request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor: Actor,
    pub client_ip: String,
}

impl Deref for ActorContext {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.actor
    }
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .ok_or_else(|| {
                let mut body =
                    ErrorResponse::new("Missing caller identity", "MISSING_ACTOR_CONTEXT");
                body.suggested_action = Some("Check the bearer token".to_string());
                (StatusCode::UNAUTHORIZED, Json(body))
            })
    }
}

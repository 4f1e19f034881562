use crate::auth::jwt::JwtService;
use crate::auth::models::ActorContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use opsportal_core::constants::SERVICE_USER_ID;
use opsportal_core::models::{Actor, UserRole};
use opsportal_core::AppError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

/// Counts failed authentication attempts per client IP within a fixed window.
#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Returns true once the IP has reached the failure limit.
    pub async fn record_failure(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();
        let (count, reset_at) = guard
            .entry(ip.to_string())
            .or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        *count += 1;
        *count >= self.max_failures
    }

    pub async fn is_blocked(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if let Some((count, reset_at)) = guard.get(ip) {
            if Instant::now() >= *reset_at {
                guard.remove(ip);
                return false;
            }
            return *count >= self.max_failures;
        }
        false
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub master_api_key: String,
    pub jwt: JwtService,
    pub auth_failure_limiter: Option<Arc<AuthFailureLimiter>>,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// First hop of `X-Forwarded-For`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<std::net::IpAddr>().is_ok())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_failures() -> Response {
    let mut body = ErrorResponse::new("Too many failed auth attempts", "AUTH_RATE_LIMITED");
    body.recoverable = true;
    body.suggested_action = Some("Wait before retrying with valid credentials".to_string());
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

/// Resolve the bearer token into an [`Actor`]: the master API key maps to the
/// service identity with the admin role, anything else must be a valid JWT.
fn resolve_actor(auth_state: &AuthState, token: &str) -> Result<Actor, AppError> {
    if secure_compare(token, &auth_state.master_api_key) {
        return Ok(Actor::new(SERVICE_USER_ID, None, UserRole::Admin));
    }
    auth_state.jwt.authenticate(token)
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = client_ip(request.headers(), peer);
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    if let Some(ref limiter) = auth_state.auth_failure_limiter {
        if limiter.is_blocked(&client_ip).await {
            return too_many_failures();
        }
    }

    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))
        .and_then(|header| {
            header.strip_prefix("Bearer ").map(str::trim).ok_or_else(|| {
                AppError::Unauthorized("Invalid authorization header format".to_string())
            })
        });

    let outcome = token.and_then(|token| resolve_actor(&auth_state, token));

    match outcome {
        Ok(actor) => {
            audit::log_authentication_attempt(
                Some(&actor),
                Some(client_ip.clone()),
                user_agent,
                true,
                None,
            );
            request
                .extensions_mut()
                .insert(ActorContext { actor, client_ip });
            next.run(request).await
        }
        Err(err) => {
            if let Some(ref limiter) = auth_state.auth_failure_limiter {
                if limiter.record_failure(&client_ip).await {
                    audit::log_rate_limit_exceeded(&client_ip);
                    return too_many_failures();
                }
            }
            audit::log_authentication_attempt(
                None,
                Some(client_ip),
                user_agent,
                false,
                Some(err.to_string()),
            );
            HttpAppError(err).into_response()
        }
    }
}

//! Route configuration and setup.
//!
//! Domain route groups live in [domains](domains); health checks in [health](health).

mod domains;
mod health;

use crate::auth::middleware::{auth_middleware, AuthFailureLimiter, AuthState};
use crate::auth::JwtService;
use crate::constants::{AUTH_FAILURE_WINDOW_SECS, AUTH_MAX_FAILURES, OPENAPI_JSON_PATH};
use crate::middleware::idempotency::{idempotency_middleware, setup_idempotency_state};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use opsportal_core::Config;
use opsportal_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// How often expired idempotency records are dropped
const IDEMPOTENCY_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = setup_auth_middleware(config);

    let idempotency_state = setup_idempotency_state(
        config.idempotency_ttl_secs(),
        config.request_timeout_secs(),
    );
    let idempotency_for_cleanup = idempotency_state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(IDEMPOTENCY_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            idempotency_for_cleanup.cleanup_expired().await;
        }
    });

    let public_routes = public_routes(state.clone());

    // Idempotency runs inside auth so replay keys are scoped to the caller.
    let protected_routes = protected_routes(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            idempotency_state,
            idempotency_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(auth_state),
            auth_middleware,
        ));

    let app_state_routes = public_routes.merge(protected_routes);

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        request_timeout_secs = config.request_timeout_secs(),
        request_body_limit_bytes = config.request_body_limit_bytes(),
        "HTTP limits enabled"
    );

    let app = app_state_routes
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs(),
        )))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn setup_auth_middleware(config: &Config) -> AuthState {
    AuthState {
        master_api_key: config.master_api_key().to_string(),
        jwt: JwtService::new(config.jwt_secret()),
        auth_failure_limiter: Some(Arc::new(AuthFailureLimiter::new(
            AUTH_MAX_FAILURES,
            AUTH_FAILURE_WINDOW_SECS,
        ))),
    }
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
        .route(
            OPENAPI_JSON_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .with_state(state)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(domains::plan_assignment_routes(state.clone()))
        .with_state(state)
}

//! Idempotency middleware
//!
//! A POST carrying an `Idempotency-Key` header is executed once per caller and
//! key within the TTL. Replays get the stored response with
//! `X-Idempotent-Replayed: true`, so a client retrying a time entry after a
//! network failure does not log the hours twice. A replay that arrives while the
//! first request is still running is answered with 409.
//!
//! A claim is released when the request future is dropped before a response is
//! stored (timeout, client disconnect) and in any case expires after the
//! in-flight window, which is much shorter than the replay TTL.

use crate::auth::models::ActorContext;
use crate::constants::{
    IDEMPOTENCY_KEY_HEADER, IDEMPOTENCY_REPLAYED_HEADER, MAX_IDEMPOTENCY_KEY_LEN,
};
use crate::error::{ErrorResponse, HttpAppError};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use opsportal_core::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Responses larger than this are passed through uncached
const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct CachedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    created_at: Instant,
}

#[derive(Clone)]
enum Slot {
    InFlight(Instant),
    Done(CachedResponse),
}

/// In-memory store keyed by caller, method, path and key. Single-instance only.
pub struct IdempotencyState {
    store: RwLock<HashMap<String, Slot>>,
    ttl: Duration,
    in_flight_ttl: Duration,
}

enum Claim {
    Acquired,
    InFlight,
    Replay(CachedResponse),
}

impl IdempotencyState {
    pub fn new(ttl: Duration, in_flight_ttl: Duration) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            ttl,
            in_flight_ttl,
        }
    }

    async fn claim(&self, key: &str) -> Claim {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(Slot::Done(cached)) if cached.created_at.elapsed() < self.ttl => {
                Claim::Replay(cached.clone())
            }
            Some(Slot::InFlight(started)) if started.elapsed() < self.in_flight_ttl => {
                Claim::InFlight
            }
            _ => {
                store.insert(key.to_string(), Slot::InFlight(Instant::now()));
                Claim::Acquired
            }
        }
    }

    async fn complete(&self, key: String, response: CachedResponse) {
        self.store.write().await.insert(key, Slot::Done(response));
    }

    async fn release(&self, key: &str) {
        self.store.write().await.remove(key);
    }

    /// Drop expired entries
    pub async fn cleanup_expired(&self) {
        let (ttl, in_flight_ttl) = (self.ttl, self.in_flight_ttl);
        self.store.write().await.retain(|_, slot| match slot {
            Slot::InFlight(started) => started.elapsed() < in_flight_ttl,
            Slot::Done(cached) => cached.created_at.elapsed() < ttl,
        });
    }
}

/// Releases an in-flight claim unless the response was stored first.
struct InFlightGuard {
    state: Arc<IdempotencyState>,
    key: Option<String>,
}

impl InFlightGuard {
    fn new(state: Arc<IdempotencyState>, key: String) -> Self {
        Self {
            state,
            key: Some(key),
        }
    }

    async fn release(mut self) {
        if let Some(key) = self.key.take() {
            self.state.release(&key).await;
        }
    }

    async fn complete(mut self, response: CachedResponse) {
        if let Some(key) = self.key.take() {
            self.state.complete(key, response).await;
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        if let Ok(mut store) = self.state.store.try_write() {
            store.remove(&key);
            return;
        }
        let state = self.state.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { state.release(&key).await });
        }
    }
}

fn bad_key(message: &str) -> Response {
    HttpAppError(AppError::BadRequest(message.to_string())).into_response()
}

fn rebuild(cached: CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
        .headers_mut()
        .insert(IDEMPOTENCY_REPLAYED_HEADER, HeaderValue::from_static("true"));
    response
}

pub async fn idempotency_middleware(
    State(state): State<Arc<IdempotencyState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let idempotency_key = match request.headers().get(IDEMPOTENCY_KEY_HEADER) {
        None => return next.run(request).await,
        Some(value) => match value.to_str() {
            Ok(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                warn!("Invalid Idempotency-Key header value");
                return bad_key("Invalid Idempotency-Key header");
            }
        },
    };

    if idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        warn!("Idempotency-Key too long");
        return bad_key("Idempotency-Key must be 256 characters or less");
    }

    // Keys are private to the caller so two users cannot collide or replay each other.
    let caller = request
        .extensions()
        .get::<ActorContext>()
        .map(|ctx| ctx.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    let store_key = format!(
        "{}:{}:{}:{}",
        caller,
        request.method(),
        request.uri().path(),
        idempotency_key
    );

    match state.claim(&store_key).await {
        Claim::Replay(cached) => {
            debug!(idempotency_key = %idempotency_key, "Returning cached idempotent response");
            return rebuild(cached);
        }
        Claim::InFlight => {
            let mut body = ErrorResponse::new(
                "A request with this Idempotency-Key is still being processed",
                "IDEMPOTENCY_IN_PROGRESS",
            );
            body.recoverable = true;
            body.suggested_action = Some("Retry after the original request completes".to_string());
            return (StatusCode::CONFLICT, Json(body)).into_response();
        }
        Claim::Acquired => {}
    }

    // Dropping the guard before the response is stored frees the key.
    let guard = InFlightGuard::new(state.clone(), store_key);
    let response = next.run(request).await;
    let status = response.status();

    // 5xx responses are not stored so the client can retry them.
    if status.is_server_error() {
        guard.release().await;
        return response;
    }

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Response body not cacheable");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();

    guard
        .complete(CachedResponse {
            status: status.as_u16(),
            headers,
            body: body_bytes.to_vec(),
            created_at: Instant::now(),
        })
        .await;

    Response::from_parts(parts, Body::from(body_bytes))
}

/// `in_flight_seconds` bounds how long an unfinished request blocks its key;
/// the request timeout is the natural value.
pub fn setup_idempotency_state(
    ttl_seconds: u64,
    in_flight_seconds: u64,
) -> Arc<IdempotencyState> {
    Arc::new(IdempotencyState::new(
        Duration::from_secs(ttl_seconds),
        Duration::from_secs(in_flight_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::post, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use tower_http::timeout::TimeoutLayer;

    /// Handler counts its calls; the first call takes `first_call_delay`.
    fn app(counter: Arc<AtomicUsize>, first_call_delay: Duration) -> Router {
        let state = setup_idempotency_state(60, 30);
        Router::new()
            .route(
                "/work",
                post(move || {
                    let counter = counter.clone();
                    async move {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        if n == 1 {
                            tokio::time::sleep(first_call_delay).await;
                        }
                        (StatusCode::CREATED, n.to_string())
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(state, idempotency_middleware))
    }

    fn request(key: Option<&str>) -> Request {
        let mut builder = Request::builder().method(Method::POST).uri("/work");
        if let Some(key) = key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_replay_returns_cached_response() {
        let counter = Arc::new(AtomicUsize::new(0));
        let app = app(counter.clone(), Duration::ZERO);

        let first = app.clone().oneshot(request(Some("k-1"))).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(body_text(first).await, "1");

        let second = app.oneshot(request(Some("k-1"))).await.unwrap();
        assert_eq!(second.status(), StatusCode::CREATED);
        assert_eq!(second.headers()[IDEMPOTENCY_REPLAYED_HEADER], "true");
        assert_eq!(body_text(second).await, "1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_requests_without_key_always_execute() {
        let counter = Arc::new(AtomicUsize::new(0));
        let app = app(counter.clone(), Duration::ZERO);
        app.clone().oneshot(request(None)).await.unwrap();
        app.oneshot(request(None)).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_overlong_key_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let key = "x".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        let response = app(counter.clone(), Duration::ZERO)
            .oneshot(request(Some(&key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timed_out_request_frees_key_for_retry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let app = app(counter.clone(), Duration::from_millis(200))
            .layer(TimeoutLayer::new(Duration::from_millis(50)));

        let first = app.clone().oneshot(request(Some("slow"))).await.unwrap();
        assert_eq!(first.status(), StatusCode::REQUEST_TIMEOUT);

        let retry = app.clone().oneshot(request(Some("slow"))).await.unwrap();
        assert_eq!(retry.status(), StatusCode::CREATED);
        assert!(retry.headers().get(IDEMPOTENCY_REPLAYED_HEADER).is_none());
        assert_eq!(body_text(retry).await, "2");

        let replay = app.oneshot(request(Some("slow"))).await.unwrap();
        assert_eq!(replay.status(), StatusCode::CREATED);
        assert_eq!(replay.headers()[IDEMPOTENCY_REPLAYED_HEADER], "true");
        assert_eq!(body_text(replay).await, "2");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_in_flight_key_conflicts() {
        let state = IdempotencyState::new(Duration::from_secs(60), Duration::from_secs(30));
        assert!(matches!(state.claim("a").await, Claim::Acquired));
        assert!(matches!(state.claim("a").await, Claim::InFlight));
        state.release("a").await;
        assert!(matches!(state.claim("a").await, Claim::Acquired));
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_claim() {
        let state = Arc::new(IdempotencyState::new(
            Duration::from_secs(60),
            Duration::from_secs(30),
        ));
        assert!(matches!(state.claim("a").await, Claim::Acquired));
        drop(InFlightGuard::new(state.clone(), "a".to_string()));
        assert!(matches!(state.claim("a").await, Claim::Acquired));
    }

    #[tokio::test]
    async fn test_stale_in_flight_claim_expires_before_ttl() {
        let state = IdempotencyState::new(Duration::from_secs(60), Duration::ZERO);
        assert!(matches!(state.claim("a").await, Claim::Acquired));
        assert!(matches!(state.claim("a").await, Claim::Acquired));
        state.cleanup_expired().await;
        assert!(state.store.read().await.is_empty());
    }
}

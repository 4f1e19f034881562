//! API constants

/// Prefix for every JSON endpoint. Health probes and docs live outside it.
pub const API_PREFIX: &str = "/api";

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

/// Failed authentication attempts allowed per client IP within the window
pub const AUTH_MAX_FAILURES: u32 = 10;
pub const AUTH_FAILURE_WINDOW_SECS: u64 = 900;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const IDEMPOTENCY_REPLAYED_HEADER: &str = "X-Idempotent-Replayed";
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 256;

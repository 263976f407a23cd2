//! HTTP adapter mapping throttle decisions onto responses.
//!
//! This is the consumer side of the limiter contract: derive an identifier
//! from request metadata, ask the throttle for a decision, and on rejection
//! answer `429 Too Many Requests` with `Retry-After` and `X-RateLimit-*`
//! headers. Admitted requests pass through with the same `X-RateLimit-*`
//! headers attached to the response.
//!
//! The fail-open convention lives here, not in the limiter: the limiter's
//! contract is total (every call yields a [`Decision`]), so this adapter has
//! no failure path of its own to swallow. Anything it cannot attribute to a
//! client collapses into the shared `"unknown"` bucket rather than an error.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::ratelimit::{Decision, Throttle};

/// Response header carrying the configured admission ceiling.
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
/// Response header carrying the requests still permitted in the window.
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// Response header carrying the window reset instant (epoch milliseconds).
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Identifier used when no client address can be derived.
///
/// All unidentifiable clients share this one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive a client identifier from request headers.
///
/// Prefers the first entry of `X-Forwarded-For`, falls back to `X-Real-IP`,
/// and finally to the [`UNKNOWN_CLIENT`] sentinel.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    UNKNOWN_CLIENT.to_string()
}

/// State for the throttle middleware: the backend plus an optional scope.
///
/// With a scope set, identifiers are composed as `ip:scope` so one client's
/// quota on one endpoint class does not drain its quota on another.
#[derive(Clone)]
pub struct ThrottleState {
    throttle: Arc<dyn Throttle>,
    scope: Option<String>,
}

impl ThrottleState {
    /// Throttle on the bare client identifier.
    pub fn new(throttle: Arc<dyn Throttle>) -> Self {
        Self {
            throttle,
            scope: None,
        }
    }

    /// Throttle on `ip:scope` composite identifiers.
    pub fn with_scope(throttle: Arc<dyn Throttle>, scope: impl Into<String>) -> Self {
        Self {
            throttle,
            scope: Some(scope.into()),
        }
    }

    fn identifier_for(&self, headers: &HeaderMap) -> String {
        let client = client_identifier(headers);
        match &self.scope {
            Some(scope) => format!("{}:{}", client, scope),
            None => client,
        }
    }
}

/// Axum middleware enforcing the throttle decision.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn throttle_middleware(
    State(state): State<ThrottleState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = state.identifier_for(request.headers());
    let decision = state.throttle.limit(&identifier).await;

    if decision.admitted {
        let mut response = next.run(request).await;
        apply_rate_limit_headers(response.headers_mut(), &decision);
        response
    } else {
        debug!(identifier = %identifier, "Request throttled");
        rejected_response(&decision)
    }
}

/// Build the `429` response for a rejected request.
pub fn rejected_response(decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs(SystemClock.now_millis());

    let mut headers = HeaderMap::new();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    apply_rate_limit_headers(&mut headers, decision);

    let body = Json(json!({
        "error": "too_many_requests",
        "retry_after_secs": retry_after,
    }));

    (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(HEADER_RESET, HeaderValue::from(decision.reset_at));
}

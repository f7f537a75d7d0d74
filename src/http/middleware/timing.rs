//! Response timing.
//!
//! Every response, including error and preflight responses, gets
//! `X-Response-Time: <ms>ms`.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;
use crate::routing::RouteDecision;

pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

#[derive(Debug, Clone, Copy, Default)]
pub struct TimingPolicy {
    /// Log every completed request at info level.
    pub debug_mode: bool,
}

pub async fn response_time(
    State(policy): State<TimingPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
        response.headers_mut().insert(X_RESPONSE_TIME, value);
    }

    let route = response
        .extensions()
        .get::<RouteDecision>()
        .map(|d| d.label())
        .unwrap_or("none");
    let status = response.status().as_u16();
    metrics::record_request(&method, route, status, start);

    if policy.debug_mode {
        tracing::info!(method = %method, path = %path, route, status, elapsed_ms = elapsed_ms as u64, "Request completed");
    }

    response
}

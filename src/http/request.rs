//! Request identification.
//!
//! # Responsibilities
//! - Name the request id header
//! - Build the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The same id is forwarded to backends and echoed to the client

use axum::{
    body::Body,
    http::{HeaderName, Request},
};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request id, or `"unknown"` if none was assigned.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span wrapping one request.
pub fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
    )
}

//! Terminal error shaping.
//!
//! # Responsibilities
//! - Replace responses marked `UnhandledError` with the generic envelope
//! - Catch handler panics and answer with the same envelope
//! - Answer unmatched routes with a 404 listing the known routes

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use crate::error::UnhandledError;
use crate::http::response::ErrorEnvelope;

pub const AVAILABLE_ROUTES: &[&str] = &[
    "/health",
    "/worker-info",
    "/fetch-json",
    "/container-status",
    "/api/*",
    "/* (web)",
];

pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(path = %path, error = %message, "Handler panicked");
            return ErrorEnvelope::internal(message, path).into_response();
        }
    };

    let Some(UnhandledError(message)) = response.extensions().get::<UnhandledError>().cloned() else {
        return response;
    };
    tracing::error!(path = %path, error = %message, "Unhandled error");

    // Keep the route decision so timing still labels the request.
    let (parts, _) = response.into_parts();
    let mut replacement = ErrorEnvelope::internal(message, path).into_response();
    *replacement.extensions_mut() = parts.extensions;
    replacement
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}

/// Fallback for requests no route matched.
pub async fn not_found(uri: Uri) -> Response {
    ErrorEnvelope::new(
        StatusCode::NOT_FOUND,
        "Not Found",
        format!("Route {} not found", uri.path()),
        uri.path(),
    )
    .with("available_routes", AVAILABLE_ROUTES.to_vec())
    .into_response()
}

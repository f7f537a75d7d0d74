//! Error taxonomy for the router.
//!
//! # Propagation
//! - `TransportError` is produced by instances. The health prober swallows
//!   it; route handlers turn it into a context-tagged envelope.
//! - `RouterError::BindingMissing` comes from the resolver.
//! - Anything a route handler returns as `Err` is unclassified and is shaped
//!   by the global error handler.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure talking to a backend instance.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build request for {address}: {reason}")]
    InvalidRequest { address: String, reason: String },

    #[error("request to {address} failed: {source}")]
    Request {
        address: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("{address} did not respond within {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    /// Used by in-process instances (tests, bindings) that fail without a socket.
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by dispatch.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("{binding} binding not found")]
    BindingMissing { binding: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Unclassified(String),
}

impl RouterError {
    pub fn binding_missing(binding: impl Into<String>) -> Self {
        RouterError::BindingMissing {
            binding: binding.into(),
        }
    }
}

/// Marker left on a response by an error nobody handled at route level.
///
/// The global error handler replaces such responses with the generic envelope,
/// since only it knows the request path.
#[derive(Debug, Clone)]
pub struct UnhandledError(pub String);

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(UnhandledError(self.to_string()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_missing_names_binding() {
        let err = RouterError::binding_missing("api");
        assert_eq!(err.to_string(), "api binding not found");
    }

    #[test]
    fn test_into_response_marks_unhandled() {
        let response = RouterError::Unclassified("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let marker = response.extensions().get::<UnhandledError>().unwrap();
        assert_eq!(marker.0, "boom");
    }
}

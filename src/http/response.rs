//! Structured error payloads.
//!
//! # Shape
//! ```text
//! { "error": ..., "message": ..., "path": ..., "timestamp": RFC 3339,
//!   <context-specific fields> }
//! ```
//!
//! Only the error's display string is exposed; no backtraces or debug output.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

impl ErrorEnvelope {
    pub fn new(
        status: StatusCode,
        error: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            path: path.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            context: Map::new(),
        }
    }

    /// Generic 500 used by the global error handler.
    pub fn internal(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR, message, path)
            .with("version", env!("CARGO_PKG_VERSION"))
    }

    /// Attach a context field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

//! CORS policy: wildcard origin, fixed method and header allow-lists.

use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer. Entries that fail to parse are skipped; validation
/// rejects them before this runs.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = config
        .allow_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .allow_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers(headers)
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend addresses are absolute http URLs
//! - Health paths are absolute
//! - Timeouts are non-zero
//! - CORS allow-lists parse as methods and header names
//! - The service binding does not shadow a backend name
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::substrate::BackendName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address `{value}`")]
    InvalidSocketAddress { field: &'static str, value: String },

    #[error("{field}: invalid backend URL `{value}`: {reason}")]
    InvalidBackendUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: path `{value}` must start with `/`")]
    RelativePath { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field}: `{value}` is not a valid header value")]
    InvalidHeaderValue { field: &'static str, value: String },

    #[error("cors.allow_methods: `{0}` is not a valid method")]
    InvalidMethod(String),

    #[error("cors.allow_headers: `{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("service_binding.name: `{0}` is reserved for a backend")]
    ReservedBindingName(String),

    #[error("service_binding.name: must not be empty")]
    EmptyBindingName,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.api.enabled {
        check_backend_url("api.address", &config.api.address, &mut errors);
        check_path("api.health_path", &config.api.health_path, &mut errors);
    }

    if config.web.enabled {
        check_backend_url("web.address", &config.web.address, &mut errors);
        check_path("web.health_path", &config.web.health_path, &mut errors);
        check_header_value("web.container", &config.web.container, &mut errors);
        check_header_value("web.container_kind", &config.web.container_kind, &mut errors);
    }

    if let Some(binding) = &config.service_binding {
        check_backend_url("service_binding.address", &binding.address, &mut errors);
        check_binding_name(&binding.name, &mut errors);
    }

    for (field, value) in [
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("substrate.sleep_after_secs", config.substrate.sleep_after_secs),
        (
            "substrate.idle_check_interval_secs",
            config.substrate.idle_check_interval_secs,
        ),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    for method in &config.cors.allow_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }
    for header in &config.cors.allow_headers {
        if header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::InvalidHeaderName(header.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let invalid = |reason: String| ValidationError::InvalidBackendUrl {
        field,
        value: value.to_string(),
        reason,
    };

    match Url::parse(value) {
        Ok(url) if url.scheme() != "http" => {
            errors.push(invalid(format!("unsupported scheme `{}`", url.scheme())))
        }
        Ok(url) if url.host_str().is_none() => errors.push(invalid("missing host".to_string())),
        Ok(_) => {}
        Err(e) => errors.push(invalid(e.to_string())),
    }
}

fn check_path(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}

/// Binding names share the backend namespace, so `api` and `web` are taken
/// even when that backend is disabled.
fn check_binding_name(name: &str, errors: &mut Vec<ValidationError>) {
    if name.trim().is_empty() {
        errors.push(ValidationError::EmptyBindingName);
    } else if name == BackendName::API.as_str() || name == BackendName::WEB.as_str() {
        errors.push(ValidationError::ReservedBindingName(name.to_string()));
    }
}

fn check_header_value(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::InvalidHeaderValue {
            field,
            value: value.to_string(),
        });
    }
}

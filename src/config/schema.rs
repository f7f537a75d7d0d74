//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the container router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity reported by the static routes.
    pub service: ServiceConfig,

    /// API backend served under `/api/*`.
    pub api: ApiConfig,

    /// Web backend serving every other path.
    pub web: WebConfig,

    /// Optional external service behind `/fetch-json`.
    pub service_binding: Option<ServiceBindingConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// CORS allow-lists.
    pub cors: CorsConfig,

    /// Compute substrate behavior (idle teardown).
    pub substrate: SubstrateConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Short machine name, reported by `/health`.
    pub name: String,

    /// Human-readable name, reported by `/worker-info`.
    pub display_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "container-router".to_string(),
            display_name: "Container Router".to_string(),
        }
    }
}

/// API backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Register the backend. When false, `/api/*` fails with a missing binding.
    pub enabled: bool,

    /// Base URL of the backend (e.g., "http://127.0.0.1:3000").
    pub address: String,

    /// Instance name the backend id is derived from.
    pub instance_name: String,

    /// Path probed by `/container-status`.
    pub health_path: String,

    /// Container tag attached to error envelopes.
    pub container: String,

    /// Description reported by the static routes.
    pub description: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "http://127.0.0.1:3000".to_string(),
            instance_name: "api-main".to_string(),
            health_path: "/api/health".to_string(),
            container: "APIContainer".to_string(),
            description: "Random number API".to_string(),
        }
    }
}

/// Web backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    /// Register the backend. When false, the catch-all fails with a missing binding.
    pub enabled: bool,

    /// Base URL of the backend (e.g., "http://127.0.0.1:3001").
    pub address: String,

    /// Instance name the backend id is derived from.
    pub instance_name: String,

    /// Path probed by `/container-status`.
    pub health_path: String,

    /// Container tag attached to error envelopes and the `container-name` header.
    pub container: String,

    /// Value of the `container-kind` header.
    pub container_kind: String,

    /// Description reported by the static routes.
    pub description: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "http://127.0.0.1:3001".to_string(),
            instance_name: "web-main".to_string(),
            health_path: "/".to_string(),
            container: "WebContainer".to_string(),
            container_kind: "web".to_string(),
            description: "Web front-end".to_string(),
        }
    }
}

/// External service reached through `/fetch-json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceBindingConfig {
    /// Logical binding name.
    #[serde(default = "default_binding_name")]
    pub name: String,

    /// Base URL of the bound service.
    pub address: String,
}

pub fn default_binding_name() -> String {
    "custom-worker".to_string()
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// Timeout configuration for backend calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to return response headers, in seconds.
    /// Generous by default to cover cold starts.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// CORS configuration. The allowed origin is always `*`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

/// Substrate behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubstrateConfig {
    /// Idle time after which an instance is reported as stopped.
    pub sleep_after_secs: u64,

    /// How often the idle monitor sweeps instances.
    pub idle_check_interval_secs: u64,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            sleep_after_secs: 600,
            idle_check_interval_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log every completed request with its elapsed time.
    pub debug_mode: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → consumed once at startup to build the registry and policy layers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApiConfig, CorsConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig, RouterConfig,
    ServiceBindingConfig, ServiceConfig, SubstrateConfig, TimeoutConfig, WebConfig,
};

//! Edge router for on-demand backend containers.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod random;
pub mod routing;
pub mod substrate;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RouterConfig;
pub use error::{RouterError, TransportError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

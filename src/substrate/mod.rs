//! Compute substrate seam.
//!
//! # Data Flow
//! ```text
//! BackendName ("api", "web", binding name)
//!     → registry.rs (resolve, pure lookup)
//!     → Arc<dyn Instance>
//!     → instance.rs (HttpInstance: rewrite URI, send, splice upgrades)
//!
//! Lifecycle (events.rs):
//!     first response / failure / idle sweep
//!     → InstanceEvent on a broadcast channel
//!     → observers (the router logs them)
//! ```
//!
//! # Design Decisions
//! - Instances are immutable handles shared via Arc; no locks on the hot path
//! - The router never tears an instance down; idle teardown is reported by the substrate
//! - Resolution never touches the network

pub mod events;
pub mod instance;
pub mod registry;

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
};

use crate::error::TransportError;

pub use events::{Activity, IdleMonitor, InstanceEvent};
pub use instance::HttpInstance;
pub use registry::BackendRegistry;

/// Logical name of a backend. Process-wide constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendName(Cow<'static, str>);

impl BackendName {
    pub const API: BackendName = BackendName(Cow::Borrowed("api"));
    pub const WEB: BackendName = BackendName(Cow::Borrowed("web"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An addressable compute unit.
///
/// The only capability is `forward`; latency is arbitrary (cold starts
/// included) and failure is always possible.
#[async_trait]
pub trait Instance: Send + Sync + fmt::Debug {
    /// Stable identifier of the instance.
    fn id(&self) -> &str;

    /// Send a request and return the instance's response.
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, TransportError>;

    /// Activity tracker, for instances the idle monitor should sweep.
    fn activity(&self) -> Option<&Activity> {
        None
    }
}

//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! RouteTarget (backend name, error labels, response rules)
//!     → registry.resolve(name)
//!     → instance.forward(request)
//!     → ResponseRules::apply
//!     → response, or a 500 ErrorEnvelope tagged with the container
//! ```

pub mod forward;

pub use forward::{forward, forward_to, ResponseRules, RouteTarget, CONTAINER_KIND, CONTAINER_NAME};

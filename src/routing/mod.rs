//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: RouteDecision
//! ```
//!
//! # Design Decisions
//! - Rule table fixed at startup, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: same input always yields the same decision
//! - First match wins: introspection routes, then `/api`, then the web catch-all

pub mod matcher;
pub mod router;

pub use router::{RouteDecision, RouteTable};

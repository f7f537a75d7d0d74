//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, policy layers)
//!     → request.rs (request id, tracing span)
//!     → handlers.rs (classify, dispatch)
//!     → [static payload | health aggregation | proxy::forward_to]
//!     → response.rs (error envelopes)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ErrorEnvelope;
pub use server::{AppState, HttpServer};

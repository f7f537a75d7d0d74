//! Policy middleware.
//!
//! # Order (outermost first)
//! ```text
//! request id → trace log → timing → x-powered-by → CORS → global error handler → dispatch
//! ```

pub mod cors;
pub mod errors;
pub mod timing;

pub use cors::cors_layer;
pub use errors::{global_error_handler, not_found};
pub use timing::{response_time, TimingPolicy, X_RESPONSE_TIME};

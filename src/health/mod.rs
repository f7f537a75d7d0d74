//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /container-status
//!     → aggregate.rs (resolve api + web)
//!     → probe.rs × 2, concurrently
//!     → HealthStatus per backend
//!     → OverallStatus (healthy iff both healthy)
//! ```
//!
//! # Design Decisions
//! - Probing is a total function: every failure becomes `Unhealthy`
//! - Nothing is cached; every request probes again
//! - Resolver failure is an error, not a degraded report

pub mod aggregate;
pub mod probe;

use serde::Serialize;

pub use aggregate::{BackendHealth, ContainerStatusReport, HealthAggregator, ProbeTarget};
pub use probe::HealthProber;

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }
}

/// Combined status of all probed backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

impl OverallStatus {
    pub fn from_statuses(statuses: &[HealthStatus]) -> Self {
        if statuses.iter().all(|s| s.is_healthy()) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        }
    }
}

//! Health aggregation across the api and web backends.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::RouterError;
use crate::health::{HealthProber, HealthStatus, OverallStatus};
use crate::observability::metrics;
use crate::substrate::{BackendName, BackendRegistry};

/// A backend and the path it is probed on.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub backend: BackendName,
    pub path: String,
}

impl ProbeTarget {
    pub fn new(backend: BackendName, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub status: HealthStatus,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainersHealth {
    pub api: BackendHealth,
    pub web: BackendHealth,
}

/// Body of `/container-status`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerStatusReport {
    pub containers: ContainersHealth,
    pub overall: OverallStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct HealthAggregator {
    prober: HealthProber,
    api: ProbeTarget,
    web: ProbeTarget,
}

impl HealthAggregator {
    pub fn new(prober: HealthProber, api: ProbeTarget, web: ProbeTarget) -> Self {
        Self { prober, api, web }
    }

    /// Resolve both backends, probe them concurrently and combine the results.
    ///
    /// Fails only if resolution fails; unreachable backends are reported as
    /// `unhealthy`.
    pub async fn check(&self, registry: &BackendRegistry) -> Result<ContainerStatusReport, RouterError> {
        let api = registry.resolve(&self.api.backend)?;
        let web = registry.resolve(&self.web.backend)?;

        let (api_status, web_status) = tokio::join!(
            self.prober.probe(api.as_ref(), &self.api.path),
            self.prober.probe(web.as_ref(), &self.web.path),
        );

        metrics::record_backend_health(self.api.backend.as_str(), api_status.is_healthy());
        metrics::record_backend_health(self.web.backend.as_str(), web_status.is_healthy());

        Ok(ContainerStatusReport {
            containers: ContainersHealth {
                api: BackendHealth {
                    status: api_status,
                    id: api.id().to_string(),
                },
                web: BackendHealth {
                    status: web_status,
                    id: web.id().to_string(),
                },
            },
            overall: OverallStatus::from_statuses(&[api_status, web_status]),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

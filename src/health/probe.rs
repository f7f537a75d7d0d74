//! Synthetic health probes.
//!
//! # Responsibilities
//! - Send a GET with no body to an instance's health path
//! - Bound the wait with a timeout
//! - Reduce the outcome to a `HealthStatus`

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request},
};
use tokio::time;

use crate::health::HealthStatus;
use crate::substrate::Instance;

const USER_AGENT: &str = "container-router-health-check";

#[derive(Debug, Clone)]
pub struct HealthProber {
    timeout: Duration,
}

impl HealthProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe `instance` at `path`. Never fails: any error is `Unhealthy`.
    pub async fn probe(&self, instance: &dyn Instance, path: &str) -> HealthStatus {
        let request = match Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to build health check request");
                return HealthStatus::Unhealthy;
            }
        };

        match time::timeout(self.timeout, instance.forward(request)).await {
            Ok(Ok(response)) if response.status().is_success() => HealthStatus::Healthy,
            Ok(Ok(response)) => {
                tracing::warn!(instance = instance.id(), path, status = %response.status(), "Health check failed: non-success status");
                HealthStatus::Unhealthy
            }
            Ok(Err(e)) => {
                tracing::warn!(instance = instance.id(), path, error = %e, "Health check failed: transport error");
                HealthStatus::Unhealthy
            }
            Err(_) => {
                tracing::warn!(instance = instance.id(), path, "Health check failed: timeout");
                HealthStatus::Unhealthy
            }
        }
    }
}

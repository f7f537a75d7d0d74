//! Route classification.
//!
//! # Responsibilities
//! - Hold the ordered rule table
//! - Classify a request (method + path) into exactly one `RouteDecision`
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First match wins; the table always ends with a catch-all, so
//!   classification is total

use axum::http::Method;

use crate::routing::matcher::{AnyMatcher, ExactPathMatcher, Matcher, PathPrefixMatcher};

/// What to do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDecision {
    /// `/` and `/health`: service identity, no backend call.
    StaticHealth,
    /// `/worker-info`: capability metadata.
    StaticInfo,
    /// `/fetch-json`: forward to the external service binding.
    ServiceBinding,
    /// `/container-status`: probe both backends.
    AggregateHealth,
    /// `/api/*`: forward to the api backend as-is.
    ForwardApi,
    /// Everything else: forward to the web backend.
    ForwardWeb,
}

impl RouteDecision {
    /// Stable label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            RouteDecision::StaticHealth => "health",
            RouteDecision::StaticInfo => "worker-info",
            RouteDecision::ServiceBinding => "fetch-json",
            RouteDecision::AggregateHealth => "container-status",
            RouteDecision::ForwardApi => "api",
            RouteDecision::ForwardWeb => "web",
        }
    }
}

/// Ordered classification rules.
#[derive(Debug)]
pub struct RouteTable {
    rules: Vec<(Box<dyn Matcher>, RouteDecision)>,
}

impl RouteTable {
    /// The router's fixed rule order.
    pub fn standard() -> Self {
        let rules = vec![
            rule(ExactPathMatcher::new(&["/", "/health"]), RouteDecision::StaticHealth),
            rule(ExactPathMatcher::new(&["/worker-info"]), RouteDecision::StaticInfo),
            rule(ExactPathMatcher::new(&["/fetch-json"]), RouteDecision::ServiceBinding),
            rule(ExactPathMatcher::new(&["/container-status"]), RouteDecision::AggregateHealth),
            rule(PathPrefixMatcher::new("/api"), RouteDecision::ForwardApi),
            rule(AnyMatcher, RouteDecision::ForwardWeb),
        ];
        Self { rules }
    }

    /// Classify a request. Deterministic in method and path.
    pub fn classify(&self, method: &Method, path: &str) -> RouteDecision {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.matches(method, path))
            .map(|(_, decision)| *decision)
            .unwrap_or(RouteDecision::ForwardWeb)
    }
}

fn rule(matcher: impl Matcher + 'static, decision: RouteDecision) -> (Box<dyn Matcher>, RouteDecision) {
    (Box::new(matcher), decision)
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

//! Dispatch and the router's own endpoints.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::http::request::request_id;
use crate::http::response::ErrorEnvelope;
use crate::http::server::AppState;
use crate::proxy::{forward, forward_to, ResponseRules};
use crate::routing::RouteDecision;

pub const FEATURES: &[&str] = &[
    "Path-based routing",
    "On-demand backend instances",
    "Lifecycle events (started, stopped, error)",
    "WebSocket passthrough",
    "Concurrent health aggregation",
    "CORS support",
    "Response timing",
    "Structured error envelopes",
    "Prometheus metrics",
];

/// What the static routes report about this router.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub name: String,
    pub display_name: String,
    pub version: &'static str,
    pub api_description: String,
    pub web_description: String,
    pub started_at: Instant,
}

impl ServiceIdentity {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            name: config.service.name.clone(),
            display_name: config.service.display_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            api_description: config.api.description.clone(),
            web_description: config.web.description.clone(),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Containers<'a> {
    api: &'a str,
    web: &'a str,
}

#[derive(Debug, Serialize)]
struct HealthPayload<'a> {
    status: &'static str,
    timestamp: String,
    service: &'a str,
    version: &'static str,
    containers: Containers<'a>,
    uptime: u64,
}

#[derive(Debug, Serialize)]
struct WorkerInfo<'a> {
    name: &'a str,
    version: &'static str,
    framework: &'static str,
    containers: Containers<'a>,
    features: &'static [&'static str],
}

/// Single entry point for every routed request.
///
/// Every response, including an unhandled error left for the global handler,
/// is tagged with its `RouteDecision`.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let decision = state.routes.classify(request.method(), request.uri().path());
    tracing::debug!(
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
        route = decision.label(),
        "Dispatching request"
    );

    let mut response = match decision {
        RouteDecision::StaticHealth => health(&state.identity),
        RouteDecision::StaticInfo => worker_info(&state.identity),
        RouteDecision::ServiceBinding => match fetch_json(&state, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        },
        RouteDecision::AggregateHealth => container_status(&state, request.uri().path()).await,
        RouteDecision::ForwardApi => forward_to(&state.registry, &state.api, request).await,
        RouteDecision::ForwardWeb => forward_to(&state.registry, &state.web, request).await,
    };

    response.extensions_mut().insert(decision);
    response
}

fn health(identity: &ServiceIdentity) -> Response {
    Json(HealthPayload {
        status: "healthy",
        timestamp: now(),
        service: &identity.name,
        version: identity.version,
        containers: Containers {
            api: &identity.api_description,
            web: &identity.web_description,
        },
        uptime: identity.started_at.elapsed().as_secs(),
    })
    .into_response()
}

fn worker_info(identity: &ServiceIdentity) -> Response {
    Json(WorkerInfo {
        name: &identity.display_name,
        version: identity.version,
        framework: "axum",
        containers: Containers {
            api: &identity.api_description,
            web: &identity.web_description,
        },
        features: FEATURES,
    })
    .into_response()
}

async fn container_status(state: &AppState, path: &str) -> Response {
    match state.aggregator.check(&state.registry).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Container status check failed");
            ErrorEnvelope::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Container status check failed",
                e.to_string(),
                path,
            )
            .into_response()
        }
    }
}

/// Forward to the external service binding. A missing binding is answered
/// here; transport failures are left to the global handler.
async fn fetch_json(state: &AppState, request: Request) -> Result<Response, RouterError> {
    let instance = match state.registry.resolve(&state.binding) {
        Ok(instance) => instance,
        Err(e) => {
            tracing::warn!(binding = %state.binding, "Service binding not configured");
            return Ok(ErrorEnvelope::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service Binding Error",
                e.to_string(),
                request.uri().path(),
            )
            .with("binding", state.binding.as_str())
            .into_response());
        }
    };

    tracing::info!(binding = %state.binding, "Forwarding to service binding");
    Ok(forward(instance.as_ref(), request, &ResponseRules::Passthrough).await?)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RouterConfig, ServiceBindingConfig};
    use crate::http::server::HttpServer;
    use crate::proxy::{CONTAINER_KIND, CONTAINER_NAME};
    use crate::substrate::{BackendName, BackendRegistry, Instance};
    use crate::testing::{Behavior, FakeInstance};
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderMap, Method},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        api: Arc<FakeInstance>,
        web: Arc<FakeInstance>,
    }

    fn harness_with(config: RouterConfig, api: FakeInstance, web: FakeInstance) -> Harness {
        let api = api.arc();
        let web = web.arc();
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::API, api.clone());
        registry.register(BackendName::WEB, web.clone());
        let router = HttpServer::with_registry(config, registry).router();
        Harness { router, api, web }
    }

    fn harness() -> Harness {
        harness_with(RouterConfig::default(), FakeInstance::ok("api-id"), FakeInstance::ok("web-id"))
    }

    async fn send(router: &Router, method: Method, path: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    fn assert_response_time(headers: &HeaderMap) {
        let value = headers["x-response-time"].to_str().unwrap();
        let millis = value.strip_suffix("ms").expect("ms suffix");
        assert!(millis.parse::<u64>().is_ok(), "{value}");
    }

    #[tokio::test]
    async fn test_api_paths_resolve_api_only() {
        let h = harness();
        for path in ["/api", "/api/random", "/api/random/range/100/1"] {
            let (status, headers, _) = send(&h.router, Method::GET, path).await;
            assert_eq!(status, StatusCode::OK);
            assert!(headers.get(CONTAINER_NAME).is_none());
        }
        let (status, _, _) = send(&h.router, Method::POST, "/api/random").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(h.api.seen().len(), 4);
        assert!(h.web.seen().is_empty());
    }

    #[tokio::test]
    async fn test_other_paths_resolve_web_with_identity_headers() {
        let h = harness();
        for path in ["/about", "/apiary", "/_next/static/app.js?v=2"] {
            let (status, headers, _) = send(&h.router, Method::GET, path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers[CONTAINER_NAME], "WebContainer");
            assert_eq!(headers[CONTAINER_KIND], "web");
        }
        let (_, _, _) = send(&h.router, Method::POST, "/health").await;

        assert!(h.api.seen().is_empty());
        assert_eq!(
            h.web.seen(),
            vec!["/about", "/apiary", "/_next/static/app.js?v=2", "/health"]
        );
    }

    #[tokio::test]
    async fn test_static_routes_never_reach_backends() {
        let h = harness();

        let (status, _, body) = send(&h.router, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        let health = json(&body);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["service"], "container-router");
        assert!(health.get("service-name").is_none());
        assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
        assert!(health["containers"]["api"].is_string());
        assert!(health["uptime"].is_u64());

        let (_, _, body) = send(&h.router, Method::GET, "/health").await;
        assert_eq!(json(&body)["status"], "healthy");

        let (_, _, body) = send(&h.router, Method::GET, "/worker-info").await;
        let info = json(&body);
        assert_eq!(info["name"], "Container Router");
        assert_eq!(info["features"].as_array().unwrap().len(), FEATURES.len());

        assert!(h.api.seen().is_empty());
        assert!(h.web.seen().is_empty());
    }

    #[tokio::test]
    async fn test_container_status_healthy() {
        let h = harness();
        let (status, _, body) = send(&h.router, Method::GET, "/container-status").await;
        assert_eq!(status, StatusCode::OK);

        let report = json(&body);
        assert_eq!(report["overall"], "healthy");
        assert_eq!(report["containers"]["api"]["status"], "healthy");
        assert_eq!(report["containers"]["api"]["id"], "api-id");
        assert_eq!(report["containers"]["web"]["id"], "web-id");
        assert_eq!(h.api.seen(), vec!["/api/health"]);
        assert_eq!(h.web.seen(), vec!["/"]);
    }

    #[tokio::test]
    async fn test_container_status_degraded() {
        let h = harness_with(
            RouterConfig::default(),
            FakeInstance::ok("api-id"),
            FakeInstance::failing("web-id"),
        );
        let (status, _, body) = send(&h.router, Method::GET, "/container-status").await;
        assert_eq!(status, StatusCode::OK);

        let report = json(&body);
        assert_eq!(report["overall"], "degraded");
        assert_eq!(report["containers"]["api"]["status"], "healthy");
        assert_eq!(report["containers"]["web"]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_container_status_resolver_failure() {
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::WEB, FakeInstance::ok("web-id").arc());
        let router = HttpServer::with_registry(RouterConfig::default(), registry).router();

        let (status, _, body) = send(&router, Method::GET, "/container-status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = json(&body);
        assert_eq!(envelope["error"], "Container status check failed");
        assert_eq!(envelope["message"], "api binding not found");
        assert!(envelope.get("overall").is_none());
    }

    #[tokio::test]
    async fn test_missing_api_binding() {
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::WEB, FakeInstance::ok("web-id").arc());
        let router = HttpServer::with_registry(RouterConfig::default(), registry).router();

        let (status, headers, body) = send(&router, Method::GET, "/api/random").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_response_time(&headers);
        let envelope = json(&body);
        assert_eq!(envelope["error"], "API Container Error");
        assert_eq!(envelope["path"], "/api/random");
        assert_eq!(envelope["container"], "APIContainer");
    }

    #[tokio::test]
    async fn test_every_response_is_timed() {
        let h = harness_with(
            RouterConfig::default(),
            FakeInstance::failing("api-id"),
            FakeInstance::responding("web-id", StatusCode::NOT_FOUND, "missing"),
        );

        for (method, path) in [
            (Method::GET, "/health"),
            (Method::GET, "/worker-info"),
            (Method::GET, "/fetch-json"),
            (Method::GET, "/container-status"),
            (Method::GET, "/api/random"),
            (Method::PUT, "/anything"),
        ] {
            let (_, headers, _) = send(&h.router, method, path).await;
            assert_response_time(&headers);
            assert_eq!(headers["x-powered-by"], "container-router");
            assert!(headers.contains_key("x-request-id"));
        }
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let h = harness();
        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/random")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(method), "{methods}");
        }
        assert_response_time(headers);
        assert!(h.api.seen().is_empty());
    }

    #[tokio::test]
    async fn test_simple_request_gets_wildcard_origin() {
        let h = harness();
        let request = axum::http::Request::builder()
            .uri("/health")
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_fetch_json_unbound() {
        let h = harness();
        let (status, _, body) = send(&h.router, Method::GET, "/fetch-json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = json(&body);
        assert_eq!(envelope["error"], "Service Binding Error");
        assert_eq!(envelope["message"], "custom-worker binding not found");
        assert_eq!(envelope["binding"], "custom-worker");
    }

    fn bound_router(binding: FakeInstance) -> (Router, Arc<FakeInstance>) {
        let mut config = RouterConfig::default();
        config.service_binding = Some(ServiceBindingConfig {
            name: "json-worker".into(),
            address: "http://127.0.0.1:8787".into(),
        });
        let binding = binding.arc();
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::new("json-worker"), binding.clone() as Arc<dyn Instance>);
        (HttpServer::with_registry(config, registry).router(), binding)
    }

    #[tokio::test]
    async fn test_fetch_json_passthrough() {
        let (router, binding) = bound_router(
            FakeInstance::responding("json", StatusCode::OK, r#"{"hello":"world"}"#)
                .with_header("content-type", "application/json"),
        );
        let (status, headers, body) = send(&router, Method::GET, "/fetch-json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(json(&body)["hello"], "world");
        assert_eq!(binding.seen(), vec!["/fetch-json"]);
    }

    #[tokio::test]
    async fn test_fetch_json_transport_failure_reaches_global_handler() {
        let (router, _) = bound_router(FakeInstance::failing("json"));
        let (status, headers, body) = send(&router, Method::GET, "/fetch-json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_response_time(&headers);
        let envelope = json(&body);
        assert_eq!(envelope["error"], "Internal Server Error");
        assert_eq!(envelope["message"], "connection refused");
        assert_eq!(envelope["path"], "/fetch-json");
        assert!(envelope.get("container").is_none());
    }

    #[tokio::test]
    async fn test_unhandled_error_keeps_route_decision() {
        let (router, _) = bound_router(FakeInstance::failing("json"));
        let request = axum::http::Request::builder()
            .uri("/fetch-json")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<RouteDecision>(),
            Some(&RouteDecision::ServiceBinding)
        );
    }

    #[tokio::test]
    async fn test_panics_become_generic_envelope() {
        let h = harness_with(
            RouterConfig::default(),
            FakeInstance::new("api-id", Behavior::Panic),
            FakeInstance::ok("web-id"),
        );
        let (status, headers, body) = send(&h.router, Method::GET, "/api/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_response_time(&headers);
        let envelope = json(&body);
        assert_eq!(envelope["error"], "Internal Server Error");
        assert_eq!(envelope["message"], "instance exploded");
        assert_eq!(envelope["path"], "/api/boom");
    }

    #[tokio::test]
    async fn test_not_found_lists_routes() {
        let response = crate::http::middleware::not_found("/nowhere".parse().unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope = json(&body);
        assert_eq!(envelope["error"], "Not Found");
        assert_eq!(envelope["message"], "Route /nowhere not found");
        assert!(envelope["available_routes"]
            .as_array()
            .unwrap()
            .contains(&Value::from("/container-status")));
    }
}

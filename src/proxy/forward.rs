//! Request forwarding and response rewriting.
//!
//! # Responsibilities
//! - Resolve the route's backend and relay the request untouched
//! - Apply the route's response rules
//! - Translate resolver and transport failures into a tagged envelope
//!
//! # Design Decisions
//! - A `101` response is never rewritten; touching it would break the handshake
//! - Rewriting only touches headers; bodies stream through
//! - No retries: the first failure is reported

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response, StatusCode},
    response::IntoResponse,
};

use crate::error::{RouterError, TransportError};
use crate::http::response::ErrorEnvelope;
use crate::substrate::{BackendName, BackendRegistry, Instance};

pub const CONTAINER_NAME: HeaderName = HeaderName::from_static("container-name");
pub const CONTAINER_KIND: HeaderName = HeaderName::from_static("container-kind");

/// Post-processing applied to a backend response.
#[derive(Debug, Clone)]
pub enum ResponseRules {
    /// Return the response as-is.
    Passthrough,
    /// Tag non-upgrade responses with `container-name` / `container-kind`.
    Identify { name: HeaderValue, kind: HeaderValue },
}

impl ResponseRules {
    pub fn apply(&self, mut response: Response<Body>) -> Response<Body> {
        match self {
            ResponseRules::Passthrough => response,
            ResponseRules::Identify { .. } if response.status() == StatusCode::SWITCHING_PROTOCOLS => {
                response
            }
            ResponseRules::Identify { name, kind } => {
                let headers = response.headers_mut();
                headers.insert(CONTAINER_NAME, name.clone());
                headers.insert(CONTAINER_KIND, kind.clone());
                response
            }
        }
    }
}

/// Where a forwarding route sends requests and how its failures are labelled.
#[derive(Debug, Clone)]
pub struct RouteTarget {
    pub backend: BackendName,
    /// `error` field of the failure envelope.
    pub error: &'static str,
    /// `container` tag of the failure envelope.
    pub container: String,
    pub rules: ResponseRules,
}

impl RouteTarget {
    pub fn api(container: impl Into<String>) -> Self {
        Self {
            backend: BackendName::API,
            error: "API Container Error",
            container: container.into(),
            rules: ResponseRules::Passthrough,
        }
    }

    pub fn web(container: HeaderValue, kind: HeaderValue) -> Self {
        Self {
            backend: BackendName::WEB,
            error: "Web Container Error",
            container: container.to_str().unwrap_or("WebContainer").to_string(),
            rules: ResponseRules::Identify {
                name: container,
                kind,
            },
        }
    }
}

/// Relay `request` to `instance` and apply `rules` to the response.
pub async fn forward(
    instance: &dyn Instance,
    request: Request<Body>,
    rules: &ResponseRules,
) -> Result<Response<Body>, TransportError> {
    let response = instance.forward(request).await?;
    Ok(rules.apply(response))
}

/// Resolve the target's backend and forward. Never fails: every failure
/// becomes a 500 envelope tagged with the target's container.
pub async fn forward_to(
    registry: &BackendRegistry,
    target: &RouteTarget,
    request: Request<Body>,
) -> Response<Body> {
    let path = request.uri().path().to_string();

    let result = match registry.resolve(&target.backend) {
        Ok(instance) => forward(instance.as_ref(), request, &target.rules)
            .await
            .map_err(RouterError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(backend = %target.backend, path = %path, error = %e, "{}", target.error);
            ErrorEnvelope::new(StatusCode::INTERNAL_SERVER_ERROR, target.error, e.to_string(), path)
                .with("container", target.container.as_str())
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInstance;
    use axum::body::to_bytes;

    fn web_target() -> RouteTarget {
        RouteTarget::web(HeaderValue::from_static("WebContainer"), HeaderValue::from_static("web"))
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_switching_protocols_untouched() {
        let instance = FakeInstance::responding("web", StatusCode::SWITCHING_PROTOCOLS, "")
            .with_header("upgrade", "websocket")
            .with_header("connection", "upgrade");

        let response = forward(&instance, request("/ws"), &web_target().rules).await.unwrap();
        assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert_eq!(response.headers().len(), 2);
        assert!(response.headers().get(CONTAINER_NAME).is_none());
        assert!(response.headers().get(CONTAINER_KIND).is_none());
    }

    #[tokio::test]
    async fn test_ok_gains_exactly_two_headers() {
        let instance = FakeInstance::responding("web", StatusCode::OK, "<html></html>")
            .with_header("content-type", "text/html");

        let response = forward(&instance, request("/"), &web_target().rules).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().len(), 3);
        assert_eq!(response.headers()["content-type"], "text/html");
        assert_eq!(response.headers()[CONTAINER_NAME], "WebContainer");
        assert_eq!(response.headers()[CONTAINER_KIND], "web");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html></html>");
    }

    #[tokio::test]
    async fn test_api_passthrough_untouched() {
        let instance = FakeInstance::responding("api", StatusCode::CREATED, "{}");
        let response = forward(&instance, request("/api/random"), &RouteTarget::api("APIContainer").rules)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn test_request_passed_through() {
        let instance = FakeInstance::ok("api").arc();
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::API, instance.clone());

        let response = forward_to(&registry, &RouteTarget::api("APIContainer"), request("/api/random/range/1/6?seed=1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(instance.seen(), vec!["/api/random/range/1/6?seed=1".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_binding_envelope() {
        let registry = BackendRegistry::new();
        let response = forward_to(&registry, &RouteTarget::api("APIContainer"), request("/api/random")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "API Container Error");
        assert_eq!(value["message"], "api binding not found");
        assert_eq!(value["path"], "/api/random");
        assert_eq!(value["container"], "APIContainer");
    }

    #[tokio::test]
    async fn test_transport_failure_envelope() {
        let mut registry = BackendRegistry::new();
        registry.register(BackendName::WEB, FakeInstance::failing("web").arc());

        let response = forward_to(&registry, &web_target(), request("/pricing")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTAINER_NAME).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Web Container Error");
        assert_eq!(value["message"], "connection refused");
        assert_eq!(value["container"], "WebContainer");
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler and fallback
//! - Wire up policy middleware (request id, tracing, timing, CORS, errors)
//! - Start substrate background tasks (idle monitor, lifecycle log)
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, RouterConfig};
use crate::health::{HealthAggregator, HealthProber, ProbeTarget};
use crate::http::handlers::{dispatch, ServiceIdentity};
use crate::http::middleware::{cors_layer, global_error_handler, not_found, response_time, TimingPolicy};
use crate::http::request::make_span;
use crate::proxy::RouteTarget;
use crate::routing::RouteTable;
use crate::substrate::{events::log_events, BackendName, BackendRegistry, IdleMonitor};

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BackendRegistry>,
    pub routes: Arc<RouteTable>,
    pub aggregator: Arc<HealthAggregator>,
    pub api: Arc<RouteTarget>,
    pub web: Arc<RouteTarget>,
    pub binding: BackendName,
    pub identity: Arc<ServiceIdentity>,
}

impl AppState {
    pub fn new(config: &RouterConfig, registry: Arc<BackendRegistry>) -> Self {
        let prober = HealthProber::new(Duration::from_secs(config.health_check.timeout_secs));
        let aggregator = HealthAggregator::new(
            prober,
            ProbeTarget::new(BackendName::API, config.api.health_path.clone()),
            ProbeTarget::new(BackendName::WEB, config.web.health_path.clone()),
        );

        let container_name = HeaderValue::from_str(&config.web.container)
            .unwrap_or_else(|_| HeaderValue::from_static("WebContainer"));
        let container_kind = HeaderValue::from_str(&config.web.container_kind)
            .unwrap_or_else(|_| HeaderValue::from_static("web"));

        let binding = config
            .service_binding
            .as_ref()
            .map(|b| b.name.clone())
            .unwrap_or_else(crate::config::schema::default_binding_name);

        Self {
            registry,
            routes: Arc::new(RouteTable::standard()),
            aggregator: Arc::new(aggregator),
            api: Arc::new(RouteTarget::api(config.api.container.clone())),
            web: Arc::new(RouteTarget::web(container_name, container_kind)),
            binding: BackendName::new(binding),
            identity: Arc::new(ServiceIdentity::from_config(config)),
        }
    }
}

/// HTTP server for the container router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    registry: Arc<BackendRegistry>,
}

impl HttpServer {
    /// Create a server whose backends are HTTP instances built from `config`.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        let registry = BackendRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server over an already-populated registry.
    pub fn with_registry(config: RouterConfig, registry: BackendRegistry) -> Self {
        let registry = Arc::new(registry);
        let state = AppState::new(&config, registry.clone());
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        let timing = TimingPolicy {
            debug_mode: config.observability.debug_mode,
        };

        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn(global_error_handler))
            .layer(cors_layer(&config.cors))
            .layer(SetResponseHeaderLayer::if_not_present(
                X_POWERED_BY,
                HeaderValue::from_static("container-router"),
            ))
            .layer(middleware::from_fn_with_state(timing, response_time))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(log_events(self.registry.subscribe(), shutdown.resubscribe()));

        let monitor = IdleMonitor::new(
            self.registry.clone(),
            Duration::from_secs(self.config.substrate.sleep_after_secs),
            Duration::from_secs(self.config.substrate.idle_check_interval_secs),
        );
        tokio::spawn(monitor.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

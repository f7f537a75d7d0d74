//! Container router (v1)
//!
//! An edge router in front of two on-demand backends, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────────┐
//!                    │                    CONTAINER ROUTER                       │
//!                    │                                                          │
//!   Client Request   │  ┌──────────────────────┐    ┌───────────────┐           │
//!   ─────────────────┼─▶│ policy middleware    │───▶│   routing     │           │
//!                    │  │ id/trace/timing/CORS │    │  classify     │           │
//!                    │  └──────────────────────┘    └──────┬────────┘           │
//!                    │                                     │                    │
//!                    │        ┌──────────────┬─────────────┼──────────────┐     │
//!                    │        ▼              ▼             ▼              ▼     │
//!                    │  ┌──────────┐  ┌────────────┐ ┌──────────┐  ┌──────────┐ │
//!                    │  │ static   │  │ health     │ │ proxy    │  │ proxy    │ │
//!                    │  │ payloads │  │ aggregate  │ │ /api/*   │  │ /* (web) │ │
//!                    │  └──────────┘  └─────┬──────┘ └────┬─────┘  └────┬─────┘ │
//!                    │                      │             │             │       │
//!                    │                      ▼             ▼             ▼       │
//!                    │               ┌──────────────────────────────────────┐   │
//!                    │               │ substrate: registry → instances      │───┼──▶ Backends
//!                    │               │ lifecycle events, idle monitor       │   │
//!                    │               └──────────────────────────────────────┘   │
//!                    └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use container_router::config::{self, RouterConfig};
use container_router::lifecycle::{signals, Shutdown};
use container_router::observability::{logging, metrics};
use container_router::HttpServer;

#[derive(Parser)]
#[command(name = "container-router")]
#[command(about = "Edge router for on-demand API and web containers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("container-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api = %config.api.address,
        web = %config.web.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            tracing::warn!("HTTP server exited before a shutdown signal");
            return Ok(());
        }
        _ = signals::wait_for_signal() => shutdown.trigger(),
    }

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}

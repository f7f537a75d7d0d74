//! Demo API backend: serves the random number service under `/api`.

use std::net::SocketAddr;

use axum::{extract::Path, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use container_router::observability::logging::init_with_default;
use container_router::random::{self, RandomResponse};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

#[derive(Parser)]
#[command(name = "random-api")]
#[command(about = "Demo random number API behind the container router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "random-api",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn get_random() -> Json<RandomResponse> {
    tracing::info!("Received request for a random number");
    let result = random::generate();
    tracing::info!(random = result.random, "Generated");
    Json(result)
}

async fn get_random_in_range(Path((min, max)): Path<(i64, i64)>) -> Json<RandomResponse> {
    tracing::info!(min, max, "Received request for a random number in range");
    let result = random::generate_in_range(min, max);
    tracing::info!(random = result.random, "Generated in range");
    Json(result)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_with_default("random_api=info,tower_http=info");

    let app = Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/random", get(get_random))
        .route("/api/random/range/{min}/{max}", get(get_random_in_range))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "random-api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

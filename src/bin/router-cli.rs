use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Inspect a running container router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Router liveness and identity
    Health,
    /// Router capabilities and backends
    Info,
    /// Probe both backends and report overall status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match cli.command {
        Commands::Health => "/health",
        Commands::Info => "/worker-info",
        Commands::Status => "/container-status",
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(elapsed) = res.headers().get("x-response-time").and_then(|v| v.to_str().ok()) {
        eprintln!("Router answered {} in {}", status, elapsed);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);

    if !status.is_success() {
        eprintln!("Error: router returned status {}", status);
    } else if json.get("overall").and_then(Value::as_str) == Some("degraded") {
        eprintln!("Warning: one or more backends are unhealthy");
    }
    Ok(())
}

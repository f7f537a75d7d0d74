//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use container_router::{HttpServer, RouterConfig, Shutdown};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a backend that echoes what it received as JSON, tagged with `name`.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    async fn echo(State(name): State<&'static str>, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, 1024 * 1024).await.unwrap_or_default();
        let header = |key: &str| {
            parts
                .headers
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let payload = json!({
            "backend": name,
            "method": parts.method.as_str(),
            "path": parts.uri.path_and_query().map(|pq| pq.as_str()),
            "host": header("host"),
            "request_id": header("x-request-id"),
            "body": String::from_utf8_lossy(&body),
        });
        ([("x-backend", name)], Json(payload)).into_response()
    }

    serve(Router::new().fallback(echo).with_state(name)).await
}

/// Start a backend that answers every request with `status`.
pub async fn start_status_backend(status: StatusCode) -> SocketAddr {
    serve(Router::new().fallback(move || async move { (status, "fixed") })).await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that switches protocols on every request, then echoes bytes.
pub async fn start_upgrade_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_none() {
                    return;
                }
                let handshake = b"HTTP/1.1 101 Switching Protocols\r\nconnection: upgrade\r\nupgrade: echo\r\n\r\n";
                if socket.write_all(handshake).await.is_err() {
                    return;
                }
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if socket.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    addr
}

/// Read an HTTP message head byte by byte, leaving anything after it unread.
pub async fn read_head(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => head.push(byte[0]),
        }
    }
    Some(head)
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Router config pointing at the given backends.
pub fn config_for(api: SocketAddr, web: SocketAddr) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.api.address = format!("http://{api}");
    config.web.address = format!("http://{web}");
    config.health_check.timeout_secs = 2;
    config.timeouts.request_secs = 5;
    config.observability.metrics_enabled = false;
    config
}

/// Start the router on an ephemeral port.
pub async fn start_router(config: RouterConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

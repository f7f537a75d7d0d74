//! HTTP-addressed instances.
//!
//! # Responsibilities
//! - Rewrite the inbound URI onto the backend's authority
//! - Send the request unmodified otherwise (method, headers, body)
//! - Bound the wait for response headers
//! - Splice client and backend connections after a `101 Switching Protocols`
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - The `Host` header is left as the client sent it
//! - One pooled client is shared by every instance

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, Scheme},
        Request, Response, StatusCode, Uri,
    },
};
use hyper::upgrade::OnUpgrade;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioIo,
};
use tokio::time;
use url::Url;
use uuid::Uuid;

use crate::error::TransportError;
use crate::substrate::{Activity, BackendName, Instance};

/// Shared client type used by every HTTP instance.
pub type HttpClient = Client<HttpConnector, Body>;

/// An instance reached over plain HTTP.
#[derive(Debug)]
pub struct HttpInstance {
    backend: BackendName,
    id: String,
    authority: Authority,
    client: HttpClient,
    timeout: Duration,
    activity: Activity,
}

impl HttpInstance {
    /// Create an instance for `address` (an `http://host:port` URL).
    ///
    /// The id is a UUID v5 of `instance_name`, so the same name always maps
    /// to the same id.
    pub fn new(
        backend: BackendName,
        instance_name: &str,
        address: &Url,
        client: HttpClient,
        timeout: Duration,
        activity: Activity,
    ) -> Result<Self, TransportError> {
        let invalid = |reason: &str| TransportError::InvalidRequest {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let host = address.host_str().ok_or_else(|| invalid("missing host"))?;
        let authority = match address.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            backend,
            id: instance_id(instance_name),
            authority,
            client,
            timeout,
            activity,
        })
    }

    fn rewrite(&self, request: Request<Body>) -> Result<Request<Body>, TransportError> {
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some("/".parse().map_err(|_| self.invalid("bad path"))?);
        }
        parts.uri = Uri::from_parts(uri_parts).map_err(|e| self.invalid(&e.to_string()))?;

        Ok(Request::from_parts(parts, body))
    }

    /// Record `err` against this instance's activity and hand it back.
    fn failed(&self, err: TransportError) -> TransportError {
        self.activity.record_failure(err.to_string());
        err
    }

    fn invalid(&self, reason: &str) -> TransportError {
        TransportError::InvalidRequest {
            address: self.authority.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Instance for HttpInstance {
    fn id(&self) -> &str {
        &self.id
    }

    async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let client_upgrade = wants_upgrade(&request).then(|| hyper::upgrade::on(&mut request));
        let outbound = self.rewrite(request).map_err(|e| self.failed(e))?;
        let address = self.authority.to_string();

        let mut response = match time::timeout(self.timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => return Err(self.failed(TransportError::Request { address, source })),
            Err(_) => {
                return Err(self.failed(TransportError::Timeout {
                    address,
                    timeout: self.timeout,
                }))
            }
        };
        self.activity.record_success();

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            match client_upgrade {
                Some(client_upgrade) => {
                    let backend_upgrade = hyper::upgrade::on(&mut response);
                    tokio::spawn(splice(self.backend.clone(), client_upgrade, backend_upgrade));
                }
                None => {
                    tracing::warn!(backend = %self.backend, "Backend switched protocols without an upgrade request");
                }
            }
        }

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    fn activity(&self) -> Option<&Activity> {
        Some(&self.activity)
    }
}

fn wants_upgrade(request: &Request<Body>) -> bool {
    request.headers().contains_key(header::UPGRADE)
}

/// Copy bytes both ways between the upgraded client and backend connections.
async fn splice(backend: BackendName, client: OnUpgrade, upstream: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(backend = %backend, error = %e, "Upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((to_backend, to_client)) => {
            tracing::debug!(backend = %backend, to_backend, to_client, "Upgraded connection closed");
        }
        Err(e) => {
            tracing::debug!(backend = %backend, error = %e, "Upgraded connection ended with error");
        }
    }
}

/// Deterministic id for an instance name.
pub fn instance_id(instance_name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, instance_name.as_bytes())
        .simple()
        .to_string()
}

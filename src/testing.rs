//! In-memory instances for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
};

use crate::error::TransportError;
use crate::substrate::Instance;

#[derive(Debug, Clone)]
pub enum Behavior {
    Respond { status: StatusCode, body: &'static str },
    Fail(&'static str),
    Hang,
    Panic,
}

#[derive(Debug)]
pub struct FakeInstance {
    id: String,
    behavior: Mutex<Behavior>,
    headers: Vec<(&'static str, &'static str)>,
    seen: Mutex<Vec<String>>,
}

impl FakeInstance {
    pub fn new(id: &str, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            behavior: Mutex::new(behavior),
            headers: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(id: &str, status: StatusCode, body: &'static str) -> Self {
        Self::new(id, Behavior::Respond { status, body })
    }

    pub fn ok(id: &str) -> Self {
        Self::responding(id, StatusCode::OK, "ok")
    }

    pub fn failing(id: &str) -> Self {
        Self::new(id, Behavior::Fail("connection refused"))
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Switch how later requests are answered.
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Paths (with query) of every request received, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Instance for FakeInstance {
    fn id(&self) -> &str {
        &self.id
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(target);

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Respond { status, body } => {
                let mut builder = Response::builder().status(status);
                for (name, value) in &self.headers {
                    builder = builder.header(*name, *value);
                }
                Ok(builder.body(Body::from(body)).unwrap())
            }
            Behavior::Fail(message) => Err(TransportError::Other(message.to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Other("hung".into()))
            }
            Behavior::Panic => panic!("instance exploded"),
        }
    }
}

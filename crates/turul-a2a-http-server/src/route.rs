//! Pluggable non-JSON-RPC routes

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use turul_a2a_json_rpc_server::{CallContext, ErrorEnvelope};

/// An inbound request for a registered route
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub context: CallContext,
}

impl RouteRequest {
    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// A JSON response produced by a [`RouteHandler`]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl RouteResponse {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// `200 OK` with a JSON body
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, Some(body))
    }

    /// Serialize `body` as JSON with the given status
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self::new(status, Some(value)),
            Err(err) => Self::error(ErrorEnvelope::internal_error(format!(
                "Failed to serialize response: {}",
                err
            ))),
        }
    }

    /// An error envelope with the status of its kind
    pub fn error(envelope: ErrorEnvelope) -> Self {
        let status = StatusCode::from_u16(envelope.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(&envelope).ok();
        Self::new(status, body)
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT, None)
    }
}

impl From<ErrorEnvelope> for RouteResponse {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self::error(envelope)
    }
}

/// Handler for an extra HTTP route such as `/health` or `/webhook`
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: RouteRequest) -> RouteResponse;
}

/// Route table keyed by method and path
#[derive(Default, Clone)]
pub struct Routes {
    handlers: HashMap<(Method, String), Arc<dyn RouteHandler>>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<H>(&mut self, method: Method, path: impl Into<String>, handler: H)
    where
        H: RouteHandler + 'static,
    {
        self.add_arc(method, path, Arc::new(handler));
    }

    pub fn add_arc(&mut self, method: Method, path: impl Into<String>, handler: Arc<dyn RouteHandler>) {
        self.handlers.insert((method, path.into()), handler);
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<Arc<dyn RouteHandler>> {
        self.handlers.get(&(method.clone(), path.to_string())).cloned()
    }

    /// Methods registered for `path`, sorted
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .handlers
            .keys()
            .filter(|(_, p)| p == path)
            .map(|(m, _)| m.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .keys()
            .map(|(m, p)| format!("{} {}", m, p))
            .collect();
        keys.sort();
        f.debug_struct("Routes").field("routes", &keys).finish()
    }
}

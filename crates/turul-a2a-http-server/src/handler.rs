//! HTTP request handler for A2A endpoints

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde_json::Value;
use tracing::{debug, error, warn};

use turul_a2a_json_rpc_server::{A2aDispatcher, ErrorEnvelope, PayloadResponse, decode_payload};

use crate::context::call_context_from_request;
use crate::cors::CorsLayer;
use crate::route::{RouteRequest, RouteResponse, Routes};
use crate::server::ServerConfig;

/// Routes HTTP requests to the dispatcher or to registered extra routes
#[derive(Clone)]
pub struct A2aHttpHandler {
    config: Arc<ServerConfig>,
    dispatcher: Arc<A2aDispatcher>,
    routes: Arc<Routes>,
}

impl A2aHttpHandler {
    pub fn new(config: ServerConfig, dispatcher: Arc<A2aDispatcher>, routes: Routes) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            routes: Arc::new(routes),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<A2aDispatcher> {
        &self.dispatcher
    }

    /// Handle a hyper request: read the body within the size limit, then [`respond`](Self::respond)
    pub async fn handle(&self, req: Request<hyper::body::Incoming>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();

        let body = match Limited::new(body, self.config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Request body exceeds {} bytes", self.config.max_body_size);
                return self.finish(envelope_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ErrorEnvelope::bad_request("Request body too large").with_suggestion(format!(
                        "Keep request bodies under {} bytes",
                        self.config.max_body_size
                    )),
                ));
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return self.finish(envelope_response(
                    StatusCode::BAD_REQUEST,
                    ErrorEnvelope::bad_request("Failed to read request body"),
                ));
            }
        };

        self.respond(parts.method, parts.uri, parts.headers, body).await
    }

    /// Produce the response for an already-read request
    pub async fn respond(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response<Full<Bytes>> {
        let path = uri.path().to_string();
        debug!("Handling {} {}", method, path);

        let response = if path == self.config.a2a_path {
            match method {
                Method::POST => self.handle_request_payload(&method, &uri, &headers, &body).await,
                Method::OPTIONS => preflight(),
                _ => method_not_allowed(&method, &path, "POST, OPTIONS"),
            }
        } else if path == self.config.notify_path {
            match method {
                Method::POST => {
                    self.handle_notification_payload(&method, &uri, &headers, &body)
                        .await
                }
                Method::OPTIONS => preflight(),
                _ => method_not_allowed(&method, &path, "POST, OPTIONS"),
            }
        } else if let Some(route) = self.routes.get(&method, &path) {
            let request = RouteRequest {
                context: call_context_from_request(&method, &uri, &headers),
                query: uri.query().map(str::to_string),
                method,
                path,
                headers,
                body,
            };
            route_response(route.handle(request).await)
        } else {
            let allowed = self.routes.allowed_methods(&path);
            if allowed.is_empty() {
                envelope_response(
                    StatusCode::NOT_FOUND,
                    ErrorEnvelope::not_found(format!("Path '{}' not found", path))
                        .with_suggestion(format!(
                            "A2A requests are served at {}",
                            self.config.a2a_path
                        )),
                )
            } else if method == Method::OPTIONS {
                preflight()
            } else {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                method_not_allowed(&method, &path, &allow)
            }
        };

        self.finish(response)
    }

    async fn handle_request_payload(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Response<Full<Bytes>> {
        debug!("Received A2A request: {}", String::from_utf8_lossy(body));

        let payload = match decode_payload(body) {
            Ok(payload) => payload,
            Err(failure) => {
                warn!("Rejected A2A request body: {}", failure);
                return failure_response(failure.status_code(), failure.to_envelope());
            }
        };

        let context = call_context_from_request(method, uri, headers);
        match self.dispatcher.handle_payload(payload, &context).await {
            Ok(PayloadResponse::NoContent) => empty_response(StatusCode::NO_CONTENT),
            Ok(response) => match response.into_value() {
                Some(value) => json_response(StatusCode::OK, &value),
                None => empty_response(StatusCode::NO_CONTENT),
            },
            Err(failure) => {
                warn!("Rejected A2A payload: {}", failure);
                failure_response(failure.status_code(), failure.to_envelope())
            }
        }
    }

    async fn handle_notification_payload(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Response<Full<Bytes>> {
        debug!("Received A2A notification: {}", String::from_utf8_lossy(body));

        match decode_payload(body) {
            Ok(payload) => {
                let context = call_context_from_request(method, uri, headers);
                self.dispatcher
                    .handle_notification_payload(payload, &context)
                    .await;
            }
            Err(failure) => warn!("Ignoring undecodable notification: {}", failure),
        }

        empty_response(StatusCode::ACCEPTED)
    }

    fn finish(&self, mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => Bytes::from(bytes),
        Err(err) => {
            error!("Failed to serialize response: {}", err);
            return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let mut response = Response::new(Full::new(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn failure_response(status: u16, envelope: ErrorEnvelope) -> Response<Full<Bytes>> {
    envelope_response(
        StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
        envelope,
    )
}

fn envelope_response(status: StatusCode, envelope: ErrorEnvelope) -> Response<Full<Bytes>> {
    match serde_json::to_value(&envelope) {
        Ok(value) => json_response(status, &value),
        Err(err) => {
            error!("Failed to serialize error envelope: {}", err);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn route_response(route: RouteResponse) -> Response<Full<Bytes>> {
    match route.body {
        Some(body) => json_response(route.status, &body),
        None => empty_response(route.status),
    }
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = empty_response(StatusCode::NO_CONTENT);
    CorsLayer::apply_cors_headers(response.headers_mut());
    response
}

fn method_not_allowed(method: &Method, path: &str, allow: &str) -> Response<Full<Bytes>> {
    let mut response = envelope_response(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorEnvelope::bad_request(format!("Method {} not allowed on {}", method, path))
            .with_suggestion(format!("Use one of: {}", allow)),
    );
    if let Ok(value) = HeaderValue::from_str(allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

//! HTTP A2A Server
//!
//! Accept loop and builder. Each connection is served on its own task.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use turul_a2a_json_rpc_server::{A2aDispatcher, MethodHandler, MethodRegistry};

use crate::handler::A2aHttpHandler;
use crate::route::{RouteHandler, Routes};
use crate::{HttpA2aError, Result};

/// Configuration for the HTTP A2A server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path for request-mode A2A calls
    pub a2a_path: String,
    /// Path for notification-mode A2A calls
    pub notify_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            a2a_path: "/a2a".to_string(),
            notify_path: "/a2a/notify".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [("a2a_path", &self.a2a_path), ("notify_path", &self.notify_path)] {
            if !path.starts_with('/') {
                return Err(HttpA2aError::InvalidConfig(format!(
                    "{} must start with '/', got {:?}",
                    name, path
                )));
            }
        }
        if self.a2a_path == self.notify_path {
            return Err(HttpA2aError::InvalidConfig(
                "a2a_path and notify_path must differ".to_string(),
            ));
        }
        if self.max_body_size == 0 {
            return Err(HttpA2aError::InvalidConfig(
                "max_body_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for the HTTP A2A server
#[derive(Default)]
pub struct HttpA2aServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
    routes: Routes,
}

impl HttpA2aServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the request-mode endpoint path
    pub fn a2a_path(mut self, path: impl Into<String>) -> Self {
        self.config.a2a_path = path.into();
        self
    }

    /// Set the notification endpoint path
    pub fn notify_path(mut self, path: impl Into<String>) -> Self {
        self.config.notify_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a pre-populated method registry
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register an A2A method
    pub fn method<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.registry.register(name, handler);
        self
    }

    /// Register an extra HTTP route
    pub fn route<H>(mut self, method: Method, path: impl Into<String>, handler: H) -> Self
    where
        H: RouteHandler + 'static,
    {
        self.routes.add(method, path, handler);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<HttpA2aServer> {
        self.config.validate()?;
        let dispatcher = Arc::new(A2aDispatcher::new(self.registry));
        let handler = A2aHttpHandler::new(self.config.clone(), dispatcher, self.routes);
        Ok(HttpA2aServer {
            config: self.config,
            handler,
        })
    }
}

/// HTTP A2A Server
#[derive(Clone)]
pub struct HttpA2aServer {
    config: ServerConfig,
    handler: A2aHttpHandler,
}

impl HttpA2aServer {
    pub fn builder() -> HttpA2aServerBuilder {
        HttpA2aServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn handler(&self) -> &A2aHttpHandler {
        &self.handler
    }

    /// Bind and serve until the listener fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        info!("HTTP A2A server listening on {}", self.config.bind_address);
        info!("A2A endpoint available at: {}", self.config.a2a_path);
        info!("A2A notification endpoint available at: {}", self.config.notify_path);
        info!(
            "Registered methods: {}",
            self.handler.dispatcher().registry().methods().join(", ")
        );

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service =
                    service_fn(move |req| handle_request(req, handler.clone(), peer_addr));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Client disconnects mid-request are routine
                    let err_str = err.to_string();
                    if err_str.contains("connection closed before message completed") {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    handler: A2aHttpHandler,
    peer_addr: SocketAddr,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    info!("{} {} from {}", req.method(), req.uri().path(), peer_addr);
    let response = handler.handle(req).await;
    debug!("Responding {} to {}", response.status(), peer_addr);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.a2a_path, "/a2a");
        assert_eq!(config.notify_path, "/a2a/notify");
        assert!(config.enable_cors);
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000);
        let server = HttpA2aServer::builder()
            .bind_address(addr)
            .a2a_path("/api/a2a")
            .notify_path("/api/a2a/notify")
            .cors(false)
            .max_body_size(2048)
            .build()
            .unwrap();

        assert_eq!(server.config().bind_address, addr);
        assert_eq!(server.config().a2a_path, "/api/a2a");
        assert_eq!(server.config().notify_path, "/api/a2a/notify");
        assert!(!server.config().enable_cors);
        assert_eq!(server.config().max_body_size, 2048);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(HttpA2aServer::builder().a2a_path("a2a").build().is_err());
        assert!(
            HttpA2aServer::builder()
                .a2a_path("/same")
                .notify_path("/same")
                .build()
                .is_err()
        );
        assert!(HttpA2aServer::builder().max_body_size(0).build().is_err());
    }
}

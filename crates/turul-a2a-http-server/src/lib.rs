//! # HTTP A2A Server
//!
//! HTTP transport for A2A JSON-RPC services built on hyper.
//!
//! ## Endpoints
//! - `POST /a2a`: requests and batches, answered with success/error envelopes
//! - `POST /a2a/notify`: fire-and-forget notifications, always `202 Accepted`
//! - Extra routes registered through [`RouteHandler`]
//!
//! ## Features
//! - Request body size limit
//! - CORS support for browser-based clients
//! - Call context (method, URL, headers) handed to context-aware methods

pub mod context;
pub mod cors;
pub mod handler;
pub mod prelude;
pub mod route;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use context::call_context_from_request;
pub use cors::CorsLayer;
pub use handler::A2aHttpHandler;
pub use route::{RouteHandler, RouteRequest, RouteResponse, Routes};
pub use server::{HttpA2aServer, HttpA2aServerBuilder, ServerConfig};

// Re-export foundational types
pub use turul_a2a_json_rpc_server::{A2aDispatcher, MethodHandler, MethodRegistry};

/// Result type for HTTP A2A operations
pub type Result<T> = std::result::Result<T, HttpA2aError>;

/// HTTP A2A specific errors
#[derive(Debug, thiserror::Error)]
pub enum HttpA2aError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

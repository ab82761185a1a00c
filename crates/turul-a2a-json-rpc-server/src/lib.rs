//! # A2A JSON-RPC 2.0 Dispatcher
//!
//! A transport-agnostic JSON-RPC 2.0 dispatcher for Agent-to-Agent services.
//! Raw payloads are split into units, validated, resolved against a [`MethodRegistry`]
//! and answered with a success or error [`Envelope`].
//!
//! ## Features
//! - Named and positional parameters, with optional call-context injection
//! - Batches with in-order processing and singleton unwrapping
//! - Fire-and-forget notifications whose failures are only logged
//! - A single error mapper producing `{"success": false, "error": {...}}` envelopes
//!
//! ```rust,no_run
//! use futures::FutureExt;
//! use serde_json::json;
//! use turul_a2a_json_rpc_server::prelude::*;
//!
//! # async fn run() {
//! let registry = MethodRegistry::new().with_method(
//!     "ping",
//!     FunctionHandler::new(|_params, _ctx| async move { Ok(json!("pong")) }.boxed()),
//! );
//! let dispatcher = A2aDispatcher::new(registry);
//! let payload = json!({"jsonrpc": "2.0", "method": "ping", "id": 1});
//! let response = dispatcher.handle_payload(payload, &CallContext::default()).await;
//! # }
//! ```

pub mod batch;
pub mod binder;
pub mod context;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod mapper;
pub mod notification;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

pub mod r#async;

// Re-export main types
pub use batch::{PayloadResponse, is_empty_payload};
pub use binder::{BoundParams, ParameterBinder};
pub use context::CallContext;
pub use dispatch::{JsonRpcMessage, decode_payload, parse_json_rpc_message};
pub use envelope::{Envelope, ErrorDetail, ErrorEnvelope, ErrorKind, SuccessEnvelope};
pub use error::{
    HandlerError, HandlerResult, JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, ProtocolError,
};
pub use mapper::DispatchFailure;
pub use notification::JsonRpcNotification;
pub use r#async::{A2aDispatcher, FunctionHandler, MethodHandler};
pub use registry::MethodRegistry;
pub use request::{JsonRpcRequest, RequestParams};
pub use response::JsonRpcResponse;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes and the A2A application codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;

    pub const SERVER_ERROR: i64 = -32000;
    pub const AGENT_UNAVAILABLE: i64 = -32001;
    pub const TASK_FAILED: i64 = -32002;
    pub const TIMEOUT_ERROR: i64 = -32003;
    pub const RATE_LIMITED: i64 = -32004;
}

//! # A2A Dispatcher Prelude
//!
//! ```rust
//! use turul_a2a_json_rpc_server::prelude::*;
//! ```

pub use crate::batch::PayloadResponse;
pub use crate::context::CallContext;
pub use crate::envelope::{Envelope, ErrorEnvelope, ErrorKind};
pub use crate::error::{HandlerError, HandlerResult, JsonRpcErrorObject, ProtocolError};
pub use crate::mapper::DispatchFailure;
pub use crate::notification::JsonRpcNotification;
pub use crate::r#async::{A2aDispatcher, FunctionHandler, MethodHandler};
pub use crate::registry::MethodRegistry;
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::JsonRpcResponse;
pub use crate::types::{JsonRpcVersion, RequestId};

pub use crate::error_codes::*;

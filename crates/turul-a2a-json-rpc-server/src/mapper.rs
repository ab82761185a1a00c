//! Failure classification
//!
//! Every failure the dispatcher or coordinator can observe is a [`DispatchFailure`]; this
//! module is the only place that turns one into an outward [`ErrorEnvelope`].

use serde_json::Value;
use std::fmt;

use crate::envelope::{ErrorEnvelope, ErrorKind};
use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, ProtocolError};
use crate::types::RequestId;

/// A classified dispatch failure
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchFailure {
    /// Body was not valid JSON
    Parse { detail: String },
    /// `null`, `{}`, `[]` or `""`
    EmptyPayload,
    /// Unit failed structural validation
    InvalidRequest {
        id: Option<RequestId>,
        reason: String,
    },
    MethodNotFound { id: RequestId, method: String },
    /// Handler declared a caller-facing failure
    Protocol {
        id: RequestId,
        method: String,
        error: ProtocolError,
    },
    /// Anything else a handler raised, including panics. `detail` is for logs only.
    Internal {
        id: RequestId,
        method: String,
        detail: String,
    },
}

impl DispatchFailure {
    pub fn parse(detail: impl fmt::Display) -> Self {
        Self::Parse {
            detail: detail.to_string(),
        }
    }

    pub fn invalid_request(id: Option<RequestId>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            id,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchFailure::Parse { .. }
            | DispatchFailure::EmptyPayload
            | DispatchFailure::InvalidRequest { .. }
            | DispatchFailure::Protocol { .. } => ErrorKind::BadRequest,
            DispatchFailure::MethodNotFound { .. } => ErrorKind::NotFound,
            DispatchFailure::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// JSON-RPC error code equivalent
    pub fn code(&self) -> i64 {
        match self {
            DispatchFailure::Parse { .. } => JsonRpcErrorCode::ParseError.code(),
            DispatchFailure::EmptyPayload | DispatchFailure::InvalidRequest { .. } => {
                JsonRpcErrorCode::InvalidRequest.code()
            }
            DispatchFailure::MethodNotFound { .. } => JsonRpcErrorCode::MethodNotFound.code(),
            DispatchFailure::Protocol { error, .. } => error.code,
            DispatchFailure::Internal { .. } => JsonRpcErrorCode::InternalError.code(),
        }
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            DispatchFailure::Parse { .. } | DispatchFailure::EmptyPayload => None,
            DispatchFailure::InvalidRequest { id, .. } => id.as_ref(),
            DispatchFailure::MethodNotFound { id, .. }
            | DispatchFailure::Protocol { id, .. }
            | DispatchFailure::Internal { id, .. } => Some(id),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Caller-facing message
    pub fn message(&self) -> String {
        match self {
            DispatchFailure::Parse { .. } => "Invalid JSON in request body".to_string(),
            DispatchFailure::EmptyPayload => "Empty request body".to_string(),
            DispatchFailure::InvalidRequest { reason, .. } => format!("Invalid request: {reason}"),
            DispatchFailure::MethodNotFound { method, .. } => format!("Method '{method}' not found"),
            DispatchFailure::Protocol { error, .. } => error.message.clone(),
            DispatchFailure::Internal { method, .. } => format!("Error executing {method}"),
        }
    }

    fn suggestion(&self) -> &'static str {
        match self {
            DispatchFailure::Parse { .. } => "Please check your request body is valid JSON",
            DispatchFailure::EmptyPayload => {
                "Send a JSON-RPC 2.0 request object or a non-empty array of them"
            }
            DispatchFailure::InvalidRequest { .. } => {
                "Requests need \"jsonrpc\": \"2.0\", a non-empty string \"method\", and optional object or array \"params\""
            }
            DispatchFailure::MethodNotFound { .. } => "Check the method name and try again",
            DispatchFailure::Protocol { .. } => "Check your request parameters and try again",
            DispatchFailure::Internal { .. } => "Please try again later",
        }
    }

    /// JSON-RPC error response equivalent. Internal detail is never included.
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        let object = match self {
            DispatchFailure::Protocol { error, .. } => error.clone(),
            DispatchFailure::Parse { .. } => JsonRpcErrorObject::parse_error(None),
            DispatchFailure::EmptyPayload | DispatchFailure::InvalidRequest { .. } => {
                JsonRpcErrorObject::invalid_request(Some(self.message()))
            }
            DispatchFailure::MethodNotFound { method, .. } => {
                JsonRpcErrorObject::method_not_found(method)
            }
            DispatchFailure::Internal { .. } => {
                JsonRpcErrorObject::internal_error(Some(self.message()))
            }
        };
        JsonRpcError::new(self.id().cloned(), object)
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        let rpc_error = serde_json::to_value(self.to_json_rpc_error()).unwrap_or(Value::Null);
        ErrorEnvelope::new(self.kind(), self.message())
            .with_suggestion(self.suggestion())
            .with_meta("jsonrpc_error", rpc_error)
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::Parse { detail } => write!(f, "parse error: {detail}"),
            DispatchFailure::Internal { method, detail, .. } => {
                write!(f, "internal error in {method}: {detail}")
            }
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for DispatchFailure {}

impl From<DispatchFailure> for ErrorEnvelope {
    fn from(failure: DispatchFailure) -> Self {
        failure.to_envelope()
    }
}

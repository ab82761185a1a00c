//! Application-facing response envelope
//!
//! Every dispatcher outcome is wrapped as either
//! `{"success": true, "data": {...}}` or
//! `{"success": false, "error": {"kind": ..., "message": ..., "suggestion": ...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::response::JsonRpcResponse;

/// Classified error kind carried by every error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    InternalError,
    BadRequest,
    ServiceUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InternalError => "internal_error",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::ServiceUnavailable => "service_unavailable",
        }
    }

    /// HTTP status equivalent
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::ValidationError => 422,
            ErrorKind::NotFound => 404,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::InternalError => 500,
            ErrorKind::BadRequest => 400,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    pub fn default_suggestion(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "Please check your request parameters and try again",
            ErrorKind::NotFound => "Please check the resource name and try again",
            ErrorKind::Unauthorized => "Please provide valid credentials and try again",
            ErrorKind::Forbidden => "Please check that you have access to this resource",
            ErrorKind::InternalError => {
                "Please try again later or contact support if the problem persists"
            }
            ErrorKind::BadRequest => "Please check your request and try again",
            ErrorKind::ServiceUnavailable => "The service is temporarily unavailable, please try again later",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body of an [`ErrorEnvelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// `{"success": false, "error": {...}, "meta": {...}?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ErrorEnvelope {
    /// Create an envelope with the kind's default suggestion
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                kind,
                message: message.into(),
                field: None,
                value: None,
                suggestion: Some(kind.default_suggestion().to_string()),
            },
            meta: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.error.field = Some(field.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.error.value = Some(value);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }

    pub fn status_code(&self) -> u16 {
        self.error.kind.status_code()
    }
}

/// `{"success": true, "data": {"jsonrpc": "2.0", "id": ..., "result": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub data: JsonRpcResponse,
}

/// Outcome of one request unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Failure(ErrorEnvelope),
}

impl Envelope {
    pub fn success(response: JsonRpcResponse) -> Self {
        Envelope::Success(SuccessEnvelope {
            success: true,
            data: response,
        })
    }

    pub fn failure(error: ErrorEnvelope) -> Self {
        Envelope::Failure(error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn as_response(&self) -> Option<&JsonRpcResponse> {
        match self {
            Envelope::Success(envelope) => Some(&envelope.data),
            Envelope::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ErrorEnvelope> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(envelope) => Some(envelope),
        }
    }
}

impl From<ErrorEnvelope> for Envelope {
    fn from(error: ErrorEnvelope) -> Self {
        Envelope::Failure(error)
    }
}

impl From<JsonRpcResponse> for Envelope {
    fn from(response: JsonRpcResponse) -> Self {
        Envelope::success(response)
    }
}

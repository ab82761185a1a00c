//! Structural validation of individual request units

use serde_json::{Map, Value};

use crate::mapper::DispatchFailure;
use crate::notification::JsonRpcNotification;
use crate::request::{JsonRpcRequest, RequestParams};
use crate::types::{JsonRpcVersion, RequestId};
use crate::JSONRPC_VERSION;

/// A validated request unit
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    pub fn method(&self) -> &str {
        match self {
            JsonRpcMessage::Request(request) => &request.method,
            JsonRpcMessage::Notification(notification) => &notification.method,
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, JsonRpcMessage::Notification(_))
    }
}

/// Decode a raw body. Blank input decodes as `null`, which the coordinator treats as empty.
pub fn decode_payload(body: &[u8]) -> Result<Value, DispatchFailure> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(DispatchFailure::parse)
}

/// Validate one unit and classify it as a request or a notification.
///
/// A missing or `null` id makes the unit a notification. A missing `jsonrpc`
/// member is accepted as "2.0".
pub fn parse_json_rpc_message(value: Value) -> Result<JsonRpcMessage, DispatchFailure> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(DispatchFailure::invalid_request(
                None,
                format!("expected a JSON object, got {}", type_name(&other)),
            ));
        }
    };

    let id = match object.remove("id") {
        None | Some(Value::Null) => None,
        Some(raw) => match RequestId::from_value(&raw) {
            Some(id) => Some(id),
            None if raw.is_u64() => {
                return Err(DispatchFailure::invalid_request(
                    None,
                    format!("integer id out of range (max {})", i64::MAX),
                ));
            }
            None => {
                return Err(DispatchFailure::invalid_request(
                    None,
                    "id must be a string or an integer",
                ));
            }
        },
    };

    // An absent member defaults to "2.0"
    match object.get("jsonrpc") {
        None => {}
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => {
            return Err(DispatchFailure::invalid_request(
                id,
                format!("jsonrpc must be \"{}\"", JSONRPC_VERSION),
            ));
        }
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err(DispatchFailure::invalid_request(
                id,
                "method must be a non-empty string",
            ));
        }
    };

    let params = match parse_params(&mut object) {
        Ok(params) => params,
        Err(reason) => return Err(DispatchFailure::invalid_request(id, reason)),
    };

    Ok(match id {
        Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
            version: JsonRpcVersion::V2_0,
            id,
            method,
            params,
        }),
        None => JsonRpcMessage::Notification(JsonRpcNotification {
            version: JsonRpcVersion::V2_0,
            method,
            params,
        }),
    })
}

fn parse_params(object: &mut Map<String, Value>) -> Result<Option<RequestParams>, &'static str> {
    match object.remove("params") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(RequestParams::Named(map))),
        Some(Value::Array(items)) => Ok(Some(RequestParams::Positional(items))),
        Some(_) => Err("params must be an object or an array"),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

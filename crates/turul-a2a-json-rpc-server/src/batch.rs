//! Payload-level coordination: single units, batches and notification-only payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::dispatch::{JsonRpcMessage, parse_json_rpc_message, type_name};
use crate::envelope::Envelope;
use crate::mapper::DispatchFailure;
use crate::r#async::A2aDispatcher;

/// What the transport sends back for a request-mode payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadResponse {
    Single(Envelope),
    Batch(Vec<Envelope>),
    /// Only notifications were submitted
    NoContent,
}

impl PayloadResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadResponse::NoContent)
    }

    /// JSON body to send, `None` when there is nothing to send
    pub fn into_value(self) -> Option<Value> {
        match self {
            PayloadResponse::NoContent => None,
            PayloadResponse::Single(envelope) => serde_json::to_value(envelope).ok(),
            PayloadResponse::Batch(envelopes) => serde_json::to_value(envelopes).ok(),
        }
    }

    fn from_outputs(mut outputs: Vec<Envelope>) -> Self {
        match outputs.len() {
            0 => PayloadResponse::NoContent,
            1 => match outputs.pop() {
                Some(envelope) => PayloadResponse::Single(envelope),
                None => PayloadResponse::NoContent,
            },
            _ => PayloadResponse::Batch(outputs),
        }
    }
}

/// `null`, `{}`, `[]` and `""`
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl A2aDispatcher {
    /// Handle a request-mode payload.
    ///
    /// Batch elements are processed sequentially in input order. A batch producing a
    /// single envelope is returned unwrapped. `Err` is reserved for payload-level
    /// failures (empty or structurally unusable payload).
    pub async fn handle_payload(
        &self,
        payload: Value,
        context: &CallContext,
    ) -> Result<PayloadResponse, DispatchFailure> {
        if is_empty_payload(&payload) {
            return Err(DispatchFailure::EmptyPayload);
        }

        match payload {
            Value::Array(units) => {
                debug!("Processing batch of {} units", units.len());
                let mut outputs = Vec::with_capacity(units.len());
                for unit in units {
                    if let Some(envelope) = self.handle_unit(unit, context).await {
                        outputs.push(envelope);
                    }
                }
                Ok(PayloadResponse::from_outputs(outputs))
            }
            object @ Value::Object(_) => match parse_json_rpc_message(object)? {
                JsonRpcMessage::Request(request) => Ok(PayloadResponse::Single(
                    self.dispatch_request(request, context).await,
                )),
                JsonRpcMessage::Notification(notification) => {
                    self.dispatch_notification(notification, context).await;
                    Ok(PayloadResponse::NoContent)
                }
            },
            other => Err(DispatchFailure::invalid_request(
                None,
                format!(
                    "expected a JSON object or array, got {}",
                    type_name(&other)
                ),
            )),
        }
    }

    async fn handle_unit(&self, unit: Value, context: &CallContext) -> Option<Envelope> {
        match parse_json_rpc_message(unit) {
            Ok(JsonRpcMessage::Request(request)) => {
                Some(self.dispatch_request(request, context).await)
            }
            Ok(JsonRpcMessage::Notification(notification)) => {
                self.dispatch_notification(notification, context).await;
                None
            }
            Err(failure) => {
                debug!("Rejected batch element: {}", failure);
                Some(Envelope::failure(failure.to_envelope()))
            }
        }
    }

    /// Handle a notification-mode payload. Nothing is produced; problems are logged.
    pub async fn handle_notification_payload(&self, payload: Value, context: &CallContext) {
        if is_empty_payload(&payload) {
            warn!("Received empty notification");
            return;
        }

        match payload {
            Value::Array(units) => {
                for unit in units {
                    self.handle_notification_unit(unit, context).await;
                }
            }
            unit => self.handle_notification_unit(unit, context).await,
        }
    }

    async fn handle_notification_unit(&self, unit: Value, context: &CallContext) {
        match parse_json_rpc_message(unit) {
            Ok(JsonRpcMessage::Notification(notification)) => {
                self.dispatch_notification(notification, context).await;
            }
            Ok(JsonRpcMessage::Request(request)) => {
                warn!(
                    "Skipping request id={} method={} sent to notification endpoint",
                    request.id, request.method
                );
            }
            Err(failure) => {
                warn!("Skipping malformed notification: {}", failure);
            }
        }
    }
}

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    binder::ParameterBinder,
    context::CallContext,
    envelope::Envelope,
    error::{HandlerError, HandlerResult},
    mapper::DispatchFailure,
    notification::JsonRpcNotification,
    registry::MethodRegistry,
    request::{JsonRpcRequest, RequestParams},
    response::JsonRpcResponse,
    types::RequestId,
};

/// A registered A2A method
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Handle one call. `context` is `Some` only for handlers that accept it.
    async fn call(
        &self,
        params: RequestParams,
        context: Option<CallContext>,
    ) -> HandlerResult<Value>;

    /// Whether the call context is injected into this handler's params
    fn accepts_context(&self) -> bool {
        false
    }
}

/// A closure-based handler
pub struct FunctionHandler<F>
where
    F: Fn(RequestParams, Option<CallContext>) -> BoxFuture<'static, HandlerResult<Value>>
        + Send
        + Sync,
{
    handler_fn: F,
    accepts_context: bool,
}

impl<F> FunctionHandler<F>
where
    F: Fn(RequestParams, Option<CallContext>) -> BoxFuture<'static, HandlerResult<Value>>
        + Send
        + Sync,
{
    pub fn new(handler_fn: F) -> Self {
        Self {
            handler_fn,
            accepts_context: false,
        }
    }

    /// A handler that receives the call context
    pub fn context_aware(handler_fn: F) -> Self {
        Self {
            handler_fn,
            accepts_context: true,
        }
    }
}

#[async_trait]
impl<F> MethodHandler for FunctionHandler<F>
where
    F: Fn(RequestParams, Option<CallContext>) -> BoxFuture<'static, HandlerResult<Value>>
        + Send
        + Sync,
{
    async fn call(
        &self,
        params: RequestParams,
        context: Option<CallContext>,
    ) -> HandlerResult<Value> {
        (self.handler_fn)(params, context).await
    }

    fn accepts_context(&self) -> bool {
        self.accepts_context
    }
}

enum InvokeError {
    NotFound,
    Handler(HandlerError),
    Panicked(String),
}

/// Resolves and invokes methods, turning every outcome into an [`Envelope`]
#[derive(Debug, Default, Clone)]
pub struct A2aDispatcher {
    registry: MethodRegistry,
}

impl A2aDispatcher {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Dispatch a request. Never fails: unknown methods, handler errors and panics
    /// all become error envelopes.
    pub async fn dispatch_request(&self, request: JsonRpcRequest, context: &CallContext) -> Envelope {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!("Dispatching request id={} method={}", id, method);

        match self.invoke(&method, params, context).await {
            Ok(result) => Envelope::success(JsonRpcResponse::success(id, result)),
            Err(err) => {
                let failure = Self::classify(id, method, err);
                Envelope::failure(failure.to_envelope())
            }
        }
    }

    /// Dispatch a notification for its side effects. Failures are logged only.
    pub async fn dispatch_notification(
        &self,
        notification: JsonRpcNotification,
        context: &CallContext,
    ) {
        let JsonRpcNotification { method, params, .. } = notification;
        debug!("Dispatching notification method={}", method);

        match self.invoke(&method, params, context).await {
            Ok(_) => {}
            Err(InvokeError::NotFound) => {
                warn!("Notification for unknown method '{}' ignored", method);
            }
            Err(InvokeError::Handler(HandlerError::Protocol(err))) => {
                warn!("Notification '{}' failed: {}", method, err);
            }
            Err(InvokeError::Handler(HandlerError::Internal(err))) => {
                error!("Notification '{}' failed: {}", method, err);
            }
            Err(InvokeError::Panicked(msg)) => {
                error!("Notification '{}' panicked: {}", method, msg);
            }
        }
    }

    async fn invoke(
        &self,
        method: &str,
        params: Option<RequestParams>,
        context: &CallContext,
    ) -> Result<Value, InvokeError> {
        let handler = self.registry.resolve(method).ok_or(InvokeError::NotFound)?;
        let bound = ParameterBinder::bind(method, params, context, handler.accepts_context());

        match AssertUnwindSafe(handler.call(bound.params, bound.context))
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(InvokeError::Handler(err)),
            Err(payload) => Err(InvokeError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    fn classify(id: RequestId, method: String, err: InvokeError) -> DispatchFailure {
        match err {
            InvokeError::NotFound => {
                debug!("Method '{}' not found", method);
                DispatchFailure::MethodNotFound { id, method }
            }
            InvokeError::Handler(HandlerError::Protocol(error)) => {
                debug!("Method '{}' returned protocol error {}", method, error);
                DispatchFailure::Protocol { id, method, error }
            }
            InvokeError::Handler(HandlerError::Internal(err)) => {
                error!("Error executing {}: {}", method, err);
                DispatchFailure::Internal {
                    id,
                    method,
                    detail: err.to_string(),
                }
            }
            InvokeError::Panicked(detail) => {
                error!("Handler for {} panicked: {}", method, detail);
                DispatchFailure::Internal { id, method, detail }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ErrorKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    async fn echo(params: RequestParams) -> HandlerResult<Value> {
        let message = params
            .get("message")
            .or_else(|| params.get_index(0))
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::invalid_params("message is required"))?
            .to_string();
        let length = message.chars().count();
        Ok(json!({"echo": message, "length": length}))
    }

    fn echo_handler() -> impl MethodHandler {
        FunctionHandler::new(|params, _ctx| echo(params).boxed())
    }

    fn dispatcher() -> A2aDispatcher {
        let registry = MethodRegistry::new()
            .with_method("echo", echo_handler())
            .with_method(
                "boom",
                FunctionHandler::new(|_params, _ctx| {
                    async move { Err(HandlerError::internal("database password=hunter2 rejected")) }
                        .boxed()
                }),
            )
            .with_method(
                "panic",
                FunctionHandler::new(|_params, _ctx| {
                    async move {
                        if true {
                            panic!("handler blew up");
                        }
                        Ok(Value::Null)
                    }
                    .boxed()
                }),
            )
            .with_method(
                "whoami",
                FunctionHandler::context_aware(|params, ctx| {
                    async move {
                        Ok(json!({
                            "injected": params.get("context").cloned(),
                            "typed_url": ctx.map(|c| c.url),
                        }))
                    }
                    .boxed()
                }),
            );
        A2aDispatcher::new(registry)
    }

    fn ctx() -> CallContext {
        CallContext::new("POST", "http://localhost:8000/a2a")
    }

    fn named(value: Value) -> Option<RequestParams> {
        match value {
            Value::Object(map) => Some(RequestParams::Named(map)),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_echo_success_envelope() {
        let request = JsonRpcRequest::new(
            RequestId::Number(1),
            "echo",
            named(json!({"message": "hi"})),
        );
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "data": {"jsonrpc": "2.0", "id": 1, "result": {"echo": "hi", "length": 2}}
            })
        );
    }

    #[tokio::test]
    async fn test_positional_params_reach_handler() {
        let request = JsonRpcRequest::new_with_positional_params(
            RequestId::String("p".to_string()),
            "echo",
            vec![json!("héllo")],
        );
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let response = envelope.as_response().unwrap();

        assert_eq!(response.result, json!({"echo": "héllo", "length": 5}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let request = JsonRpcRequest::new_no_params(RequestId::Number(2), "nope");
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let failure = envelope.as_failure().unwrap();

        assert_eq!(failure.kind(), ErrorKind::NotFound);
        assert_eq!(failure.error.message, "Method 'nope' not found");
    }

    #[tokio::test]
    async fn test_protocol_error_is_bad_request() {
        let request = JsonRpcRequest::new_no_params(RequestId::Number(3), "echo");
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let failure = envelope.as_failure().unwrap();

        assert_eq!(failure.kind(), ErrorKind::BadRequest);
        assert_eq!(failure.error.message, "message is required");
        assert_eq!(failure.meta.as_ref().unwrap()["jsonrpc_error"]["error"]["code"], -32602);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_internal_error_is_logged_not_leaked() {
        let request = JsonRpcRequest::new_no_params(RequestId::Number(4), "boom");
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let rendered = serde_json::to_string(&envelope).unwrap();

        assert!(rendered.contains("Error executing boom"));
        assert!(rendered.contains("internal_error"));
        assert!(!rendered.contains("hunter2"));
        assert!(logs_contain("hunter2"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_panic_becomes_internal_error() {
        let request = JsonRpcRequest::new_no_params(RequestId::Number(5), "panic");
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let failure = envelope.as_failure().unwrap();

        assert_eq!(failure.kind(), ErrorKind::InternalError);
        assert_eq!(failure.error.message, "Error executing panic");
        assert!(logs_contain("handler blew up"));
    }

    #[tokio::test]
    async fn test_context_aware_handler_gets_context() {
        let request = JsonRpcRequest::new(
            RequestId::Number(6),
            "whoami",
            named(json!({"context": "spoofed"})),
        );
        let envelope = dispatcher().dispatch_request(request, &ctx()).await;
        let result = &envelope.as_response().unwrap().result;

        assert_eq!(result["injected"]["url"], "http://localhost:8000/a2a");
        assert_eq!(result["injected"]["method"], "POST");
        assert_eq!(result["typed_url"], "http://localhost:8000/a2a");
    }

    #[tokio::test]
    async fn test_plain_handler_does_not_get_context() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let registry = MethodRegistry::new().with_method(
            "count",
            FunctionHandler::new(move |params: RequestParams, ctx| {
                let counter = counter.clone();
                async move {
                    assert!(ctx.is_none());
                    assert!(params.get("context").is_none());
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }
                .boxed()
            }),
        );
        let dispatcher = A2aDispatcher::new(registry);

        let envelope = dispatcher
            .dispatch_request(JsonRpcRequest::new_no_params(RequestId::Number(7), "count"), &ctx())
            .await;
        assert!(envelope.is_success());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_notification_failures_are_swallowed() {
        let dispatcher = dispatcher();

        dispatcher
            .dispatch_notification(JsonRpcNotification::new_no_params("nope"), &ctx())
            .await;
        dispatcher
            .dispatch_notification(JsonRpcNotification::new_no_params("boom"), &ctx())
            .await;
        dispatcher
            .dispatch_notification(JsonRpcNotification::new_no_params("panic"), &ctx())
            .await;

        assert!(logs_contain("Notification for unknown method 'nope' ignored"));
        assert!(logs_contain("Notification 'boom' failed"));
        assert!(logs_contain("Notification 'panic' panicked"));
    }
}

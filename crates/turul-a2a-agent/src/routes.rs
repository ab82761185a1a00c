//! Plain HTTP routes served next to the A2A endpoints

use std::sync::Arc;

use async_trait::async_trait;
use hyper::{Method, StatusCode};
use serde_json::json;
use tracing::{error, warn};

use turul_a2a_http_server::{HttpA2aServerBuilder, RouteHandler, RouteRequest, RouteResponse};
use turul_a2a_json_rpc_server::ErrorEnvelope;

use crate::llm::{LlmBackend, LlmHealth};
use crate::webhook::{WebhookError, WebhookMessage, process_message};

pub const HEALTH_PATH: &str = "/health";
pub const TEST_LLM_PATH: &str = "/test-llm";
pub const WEBHOOK_PATH: &str = "/webhook";

/// `GET /`: service banner
pub struct RootRoute {
    pub app_name: String,
    pub app_version: String,
    pub a2a_path: String,
}

#[async_trait]
impl RouteHandler for RootRoute {
    async fn handle(&self, _request: RouteRequest) -> RouteResponse {
        RouteResponse::ok(json!({
            "status": "Agent is running successfully!",
            "service": "AI Code Reviewer with A2A Protocol",
            "name": self.app_name,
            "version": self.app_version,
            "endpoints": {
                "a2a": format!("{} (POST) - A2A Protocol endpoint", self.a2a_path),
                "webhook": format!("{} (POST) - Telex webhook endpoint", WEBHOOK_PATH),
                "test_llm": format!("{} (GET) - Test LLM connection", TEST_LLM_PATH),
                "health": format!("{} (GET) - Health check", HEALTH_PATH),
            }
        }))
    }
}

/// `GET /health`
pub struct HealthRoute {
    pub llm: Arc<dyn LlmBackend>,
}

#[async_trait]
impl RouteHandler for HealthRoute {
    async fn handle(&self, _request: RouteRequest) -> RouteResponse {
        let llm = self.llm.health_check().await;
        RouteResponse::ok(json!({
            "status": "healthy",
            "services": { "llm": llm },
        }))
    }
}

/// `GET /test-llm`: round trip through the LLM
pub struct TestLlmRoute {
    pub llm: Arc<dyn LlmBackend>,
}

#[async_trait]
impl RouteHandler for TestLlmRoute {
    async fn handle(&self, _request: RouteRequest) -> RouteResponse {
        match self.llm.health_check().await {
            LlmHealth::Healthy { response, .. } => RouteResponse::ok(json!({
                "status": "success",
                "llm_response": response,
                "message": "LLM connection is working correctly!",
            })),
            LlmHealth::Unhealthy { error, .. } => {
                error!("LLM test failed: {}", error);
                ErrorEnvelope::service_unavailable("LLM service is currently unavailable").into()
            }
        }
    }
}

/// `POST /webhook`: answer a chat-platform message
pub struct WebhookRoute {
    pub llm: Arc<dyn LlmBackend>,
}

#[async_trait]
impl RouteHandler for WebhookRoute {
    async fn handle(&self, request: RouteRequest) -> RouteResponse {
        let message: WebhookMessage = match request.json() {
            Ok(message) => message,
            Err(err) => {
                warn!("Invalid webhook payload: {}", err);
                return ErrorEnvelope::validation_error(format!("Invalid webhook payload: {}", err))
                    .with_suggestion("Send channel_id, sender_id and content as JSON strings")
                    .into();
            }
        };

        match process_message(self.llm.as_ref(), &message).await {
            Ok(response) => RouteResponse::json(StatusCode::OK, &response),
            Err(WebhookError::EmptyMessage) => {
                warn!("Validation error in webhook: empty message");
                ErrorEnvelope::validation_error("Empty message received")
                    .with_field("content")
                    .into()
            }
            Err(WebhookError::Llm(err)) => {
                error!("LLM service error in webhook: {}", err);
                ErrorEnvelope::service_unavailable("LLM service is currently unavailable").into()
            }
        }
    }
}

/// Add the banner, health, LLM test and webhook routes
pub fn register_routes(
    builder: HttpA2aServerBuilder,
    app_name: &str,
    app_version: &str,
    a2a_path: &str,
    llm: Arc<dyn LlmBackend>,
) -> HttpA2aServerBuilder {
    builder
        .route(
            Method::GET,
            "/",
            RootRoute {
                app_name: app_name.to_string(),
                app_version: app_version.to_string(),
                a2a_path: a2a_path.to_string(),
            },
        )
        .route(Method::GET, HEALTH_PATH, HealthRoute { llm: Arc::clone(&llm) })
        .route(Method::GET, TEST_LLM_PATH, TestLlmRoute { llm: Arc::clone(&llm) })
        .route(Method::POST, WEBHOOK_PATH, WebhookRoute { llm })
}

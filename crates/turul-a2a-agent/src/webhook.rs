//! Chat-platform webhook adapter: one inbound message, one AI reply

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::llm::{LlmBackend, LlmError};

fn default_event_type() -> String {
    "message_received".to_string()
}

/// Message delivered by the chat platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub channel_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: String,
}

/// Reply sent back to the chat platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelexResponse {
    pub channel_id: String,
    pub recipient_id: String,
    pub response_type: String,
    pub content: String,
}

impl TelexResponse {
    pub fn message(
        channel_id: impl Into<String>,
        recipient_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            recipient_id: recipient_id.into(),
            response_type: "message".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Empty message received")]
    EmptyMessage,

    #[error(transparent)]
    Llm(LlmError),
}

impl From<LlmError> for WebhookError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyInput => WebhookError::EmptyMessage,
            other => WebhookError::Llm(other),
        }
    }
}

/// Answer `message` with a reply addressed to its sender
pub async fn process_message(
    llm: &dyn LlmBackend,
    message: &WebhookMessage,
) -> Result<TelexResponse, WebhookError> {
    if message.content.trim().is_empty() {
        return Err(WebhookError::EmptyMessage);
    }

    info!(
        "Processing message from {} in channel {}",
        message.sender_id, message.channel_id
    );

    let reply = llm
        .complete(&message.content, None, None)
        .await
        .inspect_err(|e| error!("Error processing webhook message: {}", e))?;

    info!("Generated response for message from {}", message.sender_id);
    Ok(TelexResponse::message(
        message.channel_id.clone(),
        message.sender_id.clone(),
        reply,
    ))
}

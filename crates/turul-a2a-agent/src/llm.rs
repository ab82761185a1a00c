//! LLM backend used by the AI methods, the webhook and the health routes

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an **AI Code Reviewer and Helper Agent** for a developer platform. \
Your task is to analyze the user's input, which is often a code snippet. \
Based on the input, you should either: \
1. Provide a concise, constructive review, suggesting improvements for best practices, or \
2. Explain the code's purpose, or \
3. Answer a question related to the provided code. \
Keep your response professional, helpful, and format code using markdown blocks.";

pub const HEALTH_CHECK_PROMPT: &str =
    "Hello! Are you working? Please respond with a short confirmation that you're operational.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Input must be a non-empty string")]
    EmptyInput,

    #[error("LLM service is currently unavailable: {0}")]
    Unavailable(String),

    #[error("LLM service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Received empty response from LLM service")]
    EmptyResponse,

    #[error("Failed to get response from LLM service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid LLM configuration: {0}")]
    InvalidConfig(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Outcome of [`LlmBackend::health_check`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LlmHealth {
    Healthy { model: String, response: String },
    Unhealthy { model: String, error: String },
}

impl LlmHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, LlmHealth::Healthy { .. })
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a reply to `prompt`. `None` uses [`DEFAULT_SYSTEM_PROMPT`].
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
    ) -> LlmResult<String>;

    fn model(&self) -> &str;

    async fn health_check(&self) -> LlmHealth {
        match self.complete(HEALTH_CHECK_PROMPT, None, None).await {
            Ok(response) => LlmHealth::Healthy {
                model: self.model().to_string(),
                response,
            },
            Err(err) => {
                error!("LLM health check failed: {}", err);
                LlmHealth::Unhealthy {
                    model: self.model().to_string(),
                    error: err.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the Mistral chat completions API
#[derive(Debug, Clone)]
pub struct MistralClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl MistralClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> LlmResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| LlmError::InvalidConfig(format!("Invalid base URL: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(LlmError::InvalidConfig(format!(
                "Invalid scheme for LLM endpoint: {}",
                base.scheme()
            )));
        }
        // join() replaces the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("v1/chat/completions")
            .map_err(|e| LlmError::InvalidConfig(format!("Invalid base URL: {}", e)))?;

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidConfig("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("turul-a2a-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        let model = model.into();
        info!("Mistral client initialized for model {}", model);
        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LlmBackend for MistralClient {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
    ) -> LlmResult<String> {
        if prompt.trim().is_empty() {
            return Err(LlmError::EmptyInput);
        }
        let system_prompt = system_prompt
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("LLM request failed with status {}", status);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!("Generated response of length: {}", content.len());
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Stand-in used when no API key is configured
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    model: String,
    reason: String,
}

impl UnavailableBackend {
    pub fn new(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LlmBackend for UnavailableBackend {
    async fn complete(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
    ) -> LlmResult<String> {
        Err(LlmError::Unavailable(self.reason.clone()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

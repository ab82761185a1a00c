//! A2A methods exposed by the code-review agent

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde_json::{Map, Value, json};
use tracing::{error, info};
use uuid::Uuid;

use turul_a2a_json_rpc_server::error_codes::AGENT_UNAVAILABLE;
use turul_a2a_json_rpc_server::{
    FunctionHandler, HandlerError, HandlerResult, MethodHandler, MethodRegistry, RequestParams,
};

use crate::llm::{LlmBackend, LlmError};

pub const AGENT_NAME: &str = "AI Code Reviewer";
pub const AGENT_TYPE: &str = "ai_code_reviewer";
pub const AGENT_VERSION: &str = "1.0.0";

pub const METHODS: [&str; 11] = [
    "ping",
    "echo",
    "capabilities",
    "status",
    "ai.chat",
    "ai.complete",
    "ai.review_code",
    "ai.explain_code",
    "task.create",
    "task.status",
    "task.cancel",
];

const CAPABILITIES: [&str; 4] = ["code_review", "code_explanation", "ai_chat", "text_completion"];

const SUPPORTED_LANGUAGES: [&str; 8] = [
    "python",
    "javascript",
    "typescript",
    "java",
    "go",
    "rust",
    "c++",
    "c#",
];

const COMPLETION_PROMPT: &str = "You are a helpful AI assistant. Complete the given text naturally and coherently. \
Provide only the completion, not the original prompt.";

const REVIEW_PROMPT: &str = "You are an expert code reviewer. Analyze the provided code and give constructive feedback. \
Focus on: 1) Code quality and best practices, 2) Potential bugs or issues, \
3) Performance improvements, 4) Security considerations. \
Provide specific, actionable suggestions.";

const EXPLAIN_PROMPT: &str = "You are a helpful programming tutor. Explain the provided code clearly and concisely. \
Break down what each part does, explain the logic flow, and mention any important concepts. \
Make it understandable for developers at different skill levels.";

/// The methods `task.create` can run
const TASK_METHODS: [&str; 3] = ["ai.chat", "ai.review_code", "ai.explain_code"];

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Reads handler arguments by name, or by declared position for positional params.
struct ParamReader<'a> {
    params: &'a RequestParams,
    names: &'static [&'static str],
}

impl<'a> ParamReader<'a> {
    fn new(params: &'a RequestParams, names: &'static [&'static str]) -> HandlerResult<Self> {
        match params {
            RequestParams::Named(map) => {
                let mut unexpected: Vec<&str> = map
                    .keys()
                    .map(String::as_str)
                    .filter(|key| !names.contains(key))
                    .collect();
                if !unexpected.is_empty() {
                    unexpected.sort_unstable();
                    return Err(HandlerError::invalid_params(format!(
                        "Invalid params: unexpected parameter(s) {}",
                        unexpected.join(", ")
                    )));
                }
            }
            RequestParams::Positional(values) => {
                if values.len() > names.len() {
                    return Err(HandlerError::invalid_params(format!(
                        "Invalid params: expected at most {} argument(s), got {}",
                        names.len(),
                        values.len()
                    )));
                }
            }
        }
        Ok(Self { params, names })
    }

    /// The argument, with an explicit `null` treated as absent
    fn get(&self, name: &str) -> Option<&'a Value> {
        let value = match self.params {
            RequestParams::Named(map) => map.get(name),
            RequestParams::Positional(values) => self
                .names
                .iter()
                .position(|n| *n == name)
                .and_then(|index| values.get(index)),
        };
        value.filter(|v| !v.is_null())
    }

    fn optional_str(&self, name: &str) -> HandlerResult<Option<&'a str>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(HandlerError::invalid_params(format!(
                "Invalid params: {} must be a string",
                name
            ))),
        }
    }

    /// A required, non-empty string
    fn required_str(&self, name: &str) -> HandlerResult<&'a str> {
        match self.optional_str(name)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(HandlerError::invalid_params(format!(
                "Invalid params: {} is required",
                name
            ))),
        }
    }

    fn optional_u32(&self, name: &str) -> HandlerResult<Option<u32>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .map(Some)
                .ok_or_else(|| {
                    HandlerError::invalid_params(format!(
                        "Invalid params: {} must be a positive integer",
                        name
                    ))
                }),
        }
    }

    fn optional_object(&self, name: &str) -> HandlerResult<Option<&'a Map<String, Value>>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(HandlerError::invalid_params(format!(
                "Invalid params: {} must be an object",
                name
            ))),
        }
    }
}

/// The agent's A2A method implementations
pub struct A2aService {
    llm: Arc<dyn LlmBackend>,
    started: Instant,
}

impl A2aService {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Arc<Self> {
        Arc::new(Self {
            llm,
            started: Instant::now(),
        })
    }

    /// Register every method into `registry`
    pub fn register(self: &Arc<Self>, registry: &mut MethodRegistry) {
        registry.register("ping", self.handler(Self::ping));
        registry.register("echo", self.handler(Self::echo));
        registry.register("capabilities", self.handler(Self::capabilities));
        registry.register("status", self.handler(Self::status));
        registry.register("ai.chat", self.handler(Self::ai_chat));
        registry.register("ai.complete", self.handler(Self::ai_complete));
        registry.register("ai.review_code", self.handler(Self::ai_review_code));
        registry.register("ai.explain_code", self.handler(Self::ai_explain_code));
        registry.register("task.create", self.handler(Self::task_create));
        registry.register("task.status", self.handler(Self::task_status));
        registry.register("task.cancel", self.handler(Self::task_cancel));
        info!("A2A methods registered successfully");
    }

    /// A registry populated with every method
    pub fn registry(self: &Arc<Self>) -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        self.register(&mut registry);
        registry
    }

    fn handler<F, Fut>(self: &Arc<Self>, method: F) -> impl MethodHandler + 'static
    where
        F: Fn(Arc<Self>, RequestParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Value>> + Send + 'static,
    {
        let service = Arc::clone(self);
        FunctionHandler::new(move |params, _context| method(Arc::clone(&service), params).boxed())
    }

    pub fn llm(&self) -> &Arc<dyn LlmBackend> {
        &self.llm
    }

    async fn ping(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        ParamReader::new(&params, &[])?;
        Ok(json!({
            "status": "pong",
            "timestamp": now(),
            "agent": AGENT_NAME,
        }))
    }

    async fn echo(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["message"])?;
        let message = match args.get("message") {
            Some(Value::String(s)) => s.as_str(),
            Some(_) => {
                return Err(HandlerError::invalid_params(
                    "Invalid params: message must be a string",
                ));
            }
            None => return Err(HandlerError::invalid_params("Invalid params: message is required")),
        };
        Ok(json!({
            "echo": message,
            "length": message.chars().count(),
        }))
    }

    async fn capabilities(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        ParamReader::new(&params, &[])?;
        Ok(json!({
            "agent_type": AGENT_TYPE,
            "version": AGENT_VERSION,
            "capabilities": CAPABILITIES,
            "supported_languages": SUPPORTED_LANGUAGES,
            "methods": METHODS,
        }))
    }

    async fn status(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        ParamReader::new(&params, &[])?;
        let llm_health = self.llm.health_check().await;
        let health = if llm_health.is_healthy() { "healthy" } else { "degraded" };
        Ok(json!({
            "status": "online",
            "health": health,
            "services": { "llm": llm_health },
            "uptime": self.started.elapsed().as_secs(),
            "load": "normal",
        }))
    }

    async fn ai_chat(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["message", "context"])?;
        let message = args.required_str("message")?;
        let context = args.optional_object("context")?.cloned().unwrap_or_default();

        let response = self
            .llm
            .complete(message, None, None)
            .await
            .map_err(|e| llm_failure("ai.chat", e))?;

        Ok(json!({
            "response": response,
            "context": context,
            "model": self.llm.model(),
            "timestamp": now(),
        }))
    }

    async fn ai_complete(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["prompt", "max_tokens"])?;
        let prompt = args.required_str("prompt")?;
        let max_tokens = args.optional_u32("max_tokens")?;

        let completion = self
            .llm
            .complete(prompt, Some(COMPLETION_PROMPT), max_tokens)
            .await
            .map_err(|e| llm_failure("ai.complete", e))?;

        // Rough estimate: whitespace-separated words
        let tokens_used = completion.split_whitespace().count();
        Ok(json!({
            "completion": completion,
            "model": self.llm.model(),
            "tokens_used": tokens_used,
            "timestamp": now(),
        }))
    }

    async fn ai_review_code(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let (code, language, review) = self
            .code_request(&params, "review", REVIEW_PROMPT, "ai.review_code")
            .await?;
        Ok(json!({
            "review": review,
            "language": language,
            "code_length": code.chars().count(),
            "timestamp": now(),
        }))
    }

    async fn ai_explain_code(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let (code, language, explanation) = self
            .code_request(&params, "explain", EXPLAIN_PROMPT, "ai.explain_code")
            .await?;
        Ok(json!({
            "explanation": explanation,
            "language": language,
            "code_length": code.chars().count(),
            "timestamp": now(),
        }))
    }

    /// Shared body of the code review and explanation methods.
    /// Returns the code, the language (if given) and the LLM reply.
    async fn code_request<'p>(
        &self,
        params: &'p RequestParams,
        verb: &str,
        system_prompt: &str,
        method: &str,
    ) -> HandlerResult<(&'p str, Option<&'p str>, String)> {
        let args = ParamReader::new(params, &["code", "language"])?;
        let code = args.required_str("code")?;
        let language = args.optional_str("language")?.filter(|l| !l.is_empty());

        let prompt = format!(
            "Please {} this {}:\n\n```\n{}\n```",
            verb,
            language.unwrap_or("code"),
            code
        );
        let reply = self
            .llm
            .complete(&prompt, Some(system_prompt), None)
            .await
            .map_err(|e| llm_failure(method, e))?;
        Ok((code, language, reply))
    }

    async fn task_create(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["method", "params"])?;
        let method = args.required_str("method")?;
        let task_params = match args.get("params") {
            Some(Value::Object(map)) => RequestParams::Named(map.clone()),
            Some(Value::Array(values)) => RequestParams::Positional(values.clone()),
            Some(_) => {
                return Err(HandlerError::invalid_params(
                    "Invalid params: params must be an object or an array",
                ));
            }
            None => return Err(HandlerError::invalid_params("Invalid params: params is required")),
        };

        if !TASK_METHODS.contains(&method) {
            return Err(HandlerError::method_not_found(format!(
                "Method not found: {}",
                method
            )));
        }

        let task_id = format!("task_{}", Uuid::now_v7().simple());
        let created_at = now();
        info!("Running task {} for {}", task_id, method);

        // Tasks run inline; there is no queue behind task.status
        let result = match method {
            "ai.chat" => Arc::clone(&self).ai_chat(task_params).await,
            "ai.review_code" => Arc::clone(&self).ai_review_code(task_params).await,
            _ => Arc::clone(&self).ai_explain_code(task_params).await,
        }?;

        Ok(json!({
            "task_id": task_id,
            "status": "completed",
            "result": result,
            "created_at": created_at,
            "completed_at": now(),
        }))
    }

    async fn task_status(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["task_id"])?;
        let task_id = args.required_str("task_id")?;
        Ok(json!({
            "task_id": task_id,
            "status": "completed",
            "message": "Task status tracking not fully implemented",
        }))
    }

    async fn task_cancel(self: Arc<Self>, params: RequestParams) -> HandlerResult<Value> {
        let args = ParamReader::new(&params, &["task_id"])?;
        let task_id = args.required_str("task_id")?;
        Ok(json!({
            "task_id": task_id,
            "status": "cancelled",
            "message": "Task cancellation not fully implemented",
        }))
    }
}

/// Map an LLM failure to a caller-visible protocol error. Details stay in the log.
fn llm_failure(method: &str, err: LlmError) -> HandlerError {
    match err {
        LlmError::EmptyInput => {
            HandlerError::invalid_params("Invalid params: input must be a non-empty string")
        }
        other => {
            error!("Error in {}: {}", method, other);
            HandlerError::protocol(AGENT_UNAVAILABLE, "LLM service is currently unavailable")
        }
    }
}

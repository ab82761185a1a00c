//! # Turul A2A Agent
//!
//! An AI code-review agent served over A2A JSON-RPC. The LLM backend is injected,
//! so the whole server can run against a stub in tests.
//!
//! ```rust,no_run
//! use clap::Parser;
//! use turul_a2a_agent::{Settings, build_llm_backend, build_server};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let settings = Settings::parse();
//! let llm = build_llm_backend(&settings)?;
//! build_server(&settings, llm)?.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod llm;
pub mod logging;
pub mod routes;
pub mod service;
pub mod webhook;

use std::sync::Arc;

use tracing::warn;
use turul_a2a_http_server::HttpA2aServer;

pub use config::{ConfigError, Settings};
pub use llm::{LlmBackend, LlmError, LlmHealth, MistralClient, UnavailableBackend};
pub use service::A2aService;
pub use webhook::{TelexResponse, WebhookMessage};

/// The Mistral client, or [`UnavailableBackend`] when no API key is set
pub fn build_llm_backend(settings: &Settings) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match settings.api_key() {
        Some(key) => Ok(Arc::new(MistralClient::new(
            &settings.mistral_base_url,
            key,
            &settings.mistral_model,
            settings.llm_timeout(),
        )?)),
        None => {
            warn!("MISTRAL_API_KEY is not set; AI methods will report the LLM as unavailable");
            Ok(Arc::new(UnavailableBackend::new(
                &settings.mistral_model,
                "MISTRAL_API_KEY is not set",
            )))
        }
    }
}

/// Server with every A2A method and auxiliary route registered
pub fn build_server(settings: &Settings, llm: Arc<dyn LlmBackend>) -> anyhow::Result<HttpA2aServer> {
    let config = settings.server_config()?;
    let service = A2aService::new(Arc::clone(&llm));

    let builder = HttpA2aServer::builder()
        .config(config)
        .registry(service.registry());
    let server = routes::register_routes(
        builder,
        &settings.app_name,
        &settings.app_version,
        &settings.a2a_path,
        llm,
    )
    .build()?;
    Ok(server)
}

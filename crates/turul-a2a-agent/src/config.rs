//! Agent settings from command-line flags and environment variables

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{ArgAction, Parser};
use thiserror::Error;
use turul_a2a_http_server::ServerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid host address {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },
}

/// Runtime settings. Every flag can also be set through the listed environment variable.
#[derive(Parser, Clone)]
#[command(author, version, about = "AI code-review agent speaking A2A JSON-RPC", long_about = None)]
pub struct Settings {
    /// Service name reported by the banner route
    #[arg(long, env = "APP_NAME", default_value = "A2A Protocol Server")]
    pub app_name: String,

    /// Service version reported by the banner route
    #[arg(long, env = "APP_VERSION", default_value = "0.1.0")]
    pub app_version: String,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Request-mode A2A endpoint
    #[arg(long, env = "A2A_PATH", default_value = "/a2a")]
    pub a2a_path: String,

    /// Notification-mode A2A endpoint
    #[arg(long, env = "A2A_NOTIFY_PATH", default_value = "/a2a/notify")]
    pub notify_path: String,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = 1024 * 1024)]
    pub max_body_size: usize,

    /// Add CORS headers to responses
    #[arg(long, env = "CORS", default_value_t = true, action = ArgAction::Set)]
    pub cors: bool,

    /// Mistral API key; AI methods report the LLM as unavailable without one
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    pub mistral_api_key: Option<String>,

    /// Mistral chat model
    #[arg(long, env = "MISTRAL_MODEL", default_value = "mistral-small-latest")]
    pub mistral_model: String,

    /// Mistral API base URL
    #[arg(long, env = "MISTRAL_BASE_URL", default_value = "https://api.mistral.ai")]
    pub mistral_base_url: String,

    /// Timeout for a single LLM call, in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub llm_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Settings {
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidHost {
                host: self.host.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        Ok(ServerConfig {
            bind_address: self.bind_address()?,
            a2a_path: self.a2a_path.clone(),
            notify_path: self.notify_path.clone(),
            enable_cors: self.cors,
            max_body_size: self.max_body_size,
        })
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// The API key, treating an empty value as unset
    pub fn api_key(&self) -> Option<&str> {
        self.mistral_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("a2a_path", &self.a2a_path)
            .field("notify_path", &self.notify_path)
            .field("max_body_size", &self.max_body_size)
            .field("cors", &self.cors)
            .field(
                "mistral_api_key",
                &self.mistral_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("mistral_model", &self.mistral_model)
            .field("mistral_base_url", &self.mistral_base_url)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

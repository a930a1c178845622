//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::agent::{LlmBackend, LlmConfig};
use crate::error::ConfigError;

/// Default base URL of the tool-routing service.
pub const DEFAULT_BASE_URL: &str = "https://backend.composio.dev";

/// Labeler configuration, built from environment variables.
///
/// The entry point loads `.env` before calling [`Config::from_env`]; variable
/// names owned by this crate are prefixed `LABELER_`, service credentials
/// keep their upstream names.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the tool-routing service.
    pub api_key: SecretString,
    /// Base URL of the tool-routing service.
    pub base_url: String,
    /// Auth config id used when initiating a new Gmail connection.
    pub auth_config_id: Option<String>,
    /// LLM backend configuration for the labeling agent.
    pub llm: LlmConfig,
    /// Poll interval while waiting for the user to complete authorization.
    pub connect_poll_interval: Duration,
}

impl Config {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("COMPOSIO_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("COMPOSIO_API_KEY".into()))?;

        let base_url = std::env::var("COMPOSIO_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let auth_config_id = std::env::var("COMPOSIO_AUTH_CONFIG_ID").ok();

        let llm = llm_config_from_env()?;

        let connect_poll_interval = match std::env::var("LABELER_CONNECT_POLL_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "LABELER_CONNECT_POLL_SECS".into(),
                    message: format!("expected an integer number of seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs.max(1))
            }
            Err(_) => Duration::from_secs(2),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            auth_config_id,
            llm,
            connect_poll_interval,
        })
    }
}

/// Pick the LLM backend from whichever provider key is set.
///
/// Anthropic wins when both are present.
fn llm_config_from_env() -> Result<LlmConfig, ConfigError> {
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        let model = std::env::var("LABELER_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
        return Ok(LlmConfig {
            backend: LlmBackend::Anthropic,
            api_key: SecretString::from(key),
            model,
        });
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        let model = std::env::var("LABELER_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        return Ok(LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: SecretString::from(key),
            model,
        });
    }

    Err(ConfigError::MissingEnvVar(
        "ANTHROPIC_API_KEY or OPENAI_API_KEY".into(),
    ))
}

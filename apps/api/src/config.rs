use anyhow::{Context, Result};

use crate::llm_client::{AgentConfig, ProviderType};

/// Application configuration loaded from environment variables.
///
/// Only the listener settings are always present. The default agent exists when both
/// `LLM_API_KEY` and `LLM_MODEL` are set; requests without their own `agentConfig`
/// are rejected otherwise.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub default_agent: Option<AgentConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_agent: default_agent(
                optional_env("LLM_PROVIDER"),
                optional_env("LLM_API_KEY"),
                optional_env("LLM_API_URL"),
                optional_env("LLM_MODEL"),
            ),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_agent(
    provider: Option<String>,
    api_key: Option<String>,
    api_url: Option<String>,
    model: Option<String>,
) -> Option<AgentConfig> {
    Some(AgentConfig {
        provider_type: provider
            .as_deref()
            .map(ProviderType::parse)
            .unwrap_or_default(),
        api_key: api_key?,
        api_url: api_url.unwrap_or_default(),
        model: model?,
    })
}

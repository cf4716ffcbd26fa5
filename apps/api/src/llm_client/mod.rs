/// LLM Client — the single point of entry for all model provider calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Agents receive an `Arc<dyn ChatModel>` built by `create_model` and never see HTTP.
///
/// Two provider families are supported: OpenAI-compatible chat completions and
/// Gemini `generateContent`. Both support function (tool) calling.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub mod gemini;
pub mod openai;
pub mod prompts;

use gemini::GeminiClient;
use openai::OpenAiClient;

pub const MAX_OUTPUT_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Model listing is an interactive settings-page call and gets a much shorter budget.
pub const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Provider configuration
// ────────────────────────────────────────────────────────────────────────────

/// Which wire protocol a provider speaks.
///
/// Deserializes from any string. `"gemini"` selects the Gemini client; every other
/// value (including unknown ones) selects the OpenAI-compatible client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => ProviderType::Gemini,
            "" | "openai" | "openai-compatible" => ProviderType::OpenAiCompatible,
            other => {
                warn!(
                    provider = other,
                    "Unknown provider type, falling back to OpenAI-compatible"
                );
                ProviderType::OpenAiCompatible
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAiCompatible => "openai-compatible",
            ProviderType::Gemini => "gemini",
        }
    }
}

impl From<String> for ProviderType {
    fn from(value: String) -> Self {
        ProviderType::parse(&value)
    }
}

/// Provider credentials and model selection for one pipeline run.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default)]
    pub provider_type: ProviderType,
    /// May be empty for self-hosted OpenAI-compatible servers.
    #[serde(default)]
    pub api_key: String,
    /// Base URL. Empty means the provider's public endpoint.
    #[serde(default)]
    pub api_url: String,
    /// Not needed for model listing.
    #[serde(default)]
    pub model: String,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider_type", &self.provider_type)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Conversation types (provider-neutral)
// ────────────────────────────────────────────────────────────────────────────

/// A tool the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    User(String),
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        name: String,
        output: Value,
    },
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage::User(text.into())
    }
}

/// One model turn: either final text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: vec![],
        }
    }

    /// Blank text becomes `None`. An empty turn is a valid reply; each role decides
    /// whether it can use one.
    fn normalized(mut self) -> Self {
        if self.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.text = None;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tool_calls.is_empty()
    }
}

/// A chat-completion backend. Implemented by the provider clients and by the
/// scripted model used in tests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Provider dispatch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum ModelClient {
    OpenAiCompatible(OpenAiClient),
    Gemini(GeminiClient),
}

/// Builds the client for a provider config. Performs no network I/O; bad
/// credentials only surface on the first call.
pub fn create_model(config: &AgentConfig) -> ModelClient {
    match config.provider_type {
        ProviderType::Gemini => ModelClient::Gemini(GeminiClient::new(config)),
        ProviderType::OpenAiCompatible => ModelClient::OpenAiCompatible(OpenAiClient::new(config)),
    }
}

impl ModelClient {
    pub fn provider(&self) -> ProviderType {
        match self {
            ModelClient::OpenAiCompatible(_) => ProviderType::OpenAiCompatible,
            ModelClient::Gemini(_) => ProviderType::Gemini,
        }
    }

    /// Lists model identifiers available to the configured credentials.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let mut models = match self {
            ModelClient::OpenAiCompatible(c) => c.list_models().await?,
            ModelClient::Gemini(c) => c.list_models().await?,
        };
        models.sort();
        models.dedup();
        Ok(models)
    }
}

#[async_trait]
impl ChatModel for ModelClient {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        match self {
            ModelClient::OpenAiCompatible(c) => c.chat(system, messages, tools).await,
            ModelClient::Gemini(c) => c.chat(system, messages, tools).await,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared HTTP plumbing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

pub(crate) fn build_http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

pub(crate) fn trim_base_url(url: &str, default: &str) -> String {
    let url = url.trim();
    let url = if url.is_empty() { default } else { url };
    url.trim_end_matches('/').to_string()
}

/// POSTs a JSON body and deserializes the response.
/// Retries on 429, 5xx and connection errors with exponential backoff.
pub(crate) async fn post_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &Value,
) -> Result<T, LlmError> {
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: provider_error_message(text),
            });
        }

        return serde_json::from_str(&text).map_err(LlmError::Parse);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// GETs a JSON document with the short model-listing timeout. Not retried.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T, LlmError> {
    let mut request = client.get(url).timeout(MODEL_LIST_TIMEOUT);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: provider_error_message(text),
        });
    }

    serde_json::from_str(&text).map_err(LlmError::Parse)
}

fn provider_error_message(body: String) -> String {
    serde_json::from_str::<ProviderError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

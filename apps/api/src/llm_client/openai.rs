//! OpenAI-compatible chat completions client (OpenAI, OpenRouter, vLLM, Ollama, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    build_http_client, get_json, post_json, trim_base_url, AgentConfig, ChatMessage, ChatModel,
    LlmError, ModelReply, ToolCall, ToolSpec, MAX_OUTPUT_TOKENS,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const COMPLETIONS_SUFFIX: &str = "/chat/completions";

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAiClient {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: build_http_client(),
            api_key: config.api_key.clone(),
            base_url: trim_base_url(&config.api_url, DEFAULT_BASE_URL),
            model: config.model.clone(),
        }
    }

    /// A base URL that already names the completions endpoint is used verbatim.
    fn completions_url(&self) -> String {
        if self.base_url.ends_with(COMPLETIONS_SUFFIX) {
            self.base_url.clone()
        } else {
            format!("{}{}", self.base_url, COMPLETIONS_SUFFIX)
        }
    }

    fn models_url(&self) -> String {
        let root = self
            .base_url
            .strip_suffix(COMPLETIONS_SUFFIX)
            .unwrap_or(&self.base_url);
        format!("{root}/models")
    }

    fn build_body(&self, system: &str, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut wire_messages = vec![json!({ "role": "system", "content": system })];
        wire_messages.extend(messages.iter().map(encode_message));

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "messages": wire_messages,
        });

        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
        }

        body
    }

    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let auth = format!("Bearer {}", self.api_key);
        let list: ModelList =
            get_json(&self.client, &self.models_url(), &[("authorization", &auth)]).await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        let body = self.build_body(system, messages, tools);
        let auth = format!("Bearer {}", self.api_key);

        let response: CompletionResponse = post_json(
            &self.client,
            &self.completions_url(),
            &[("authorization", &auth)],
            &body,
        )
        .await?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        decode_response(response)
    }
}

fn encode_message(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::User(text) => json!({ "role": "user", "content": text }),
        ChatMessage::Assistant { text, tool_calls } => {
            let mut value = json!({ "role": "assistant", "content": text });
            if !tool_calls.is_empty() {
                value["tool_calls"] = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
            }
            value
        }
        ChatMessage::Tool {
            call_id, output, ..
        } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": output.to_string(),
        }),
    }
}

fn decode_response(response: CompletionResponse) -> Result<ModelReply, LlmError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyContent)?
        .message;

    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            // Arguments arrive as a JSON string; keep the raw text if the model garbled it
            // so the tool can report the problem back.
            arguments: serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments)),
        })
        .collect();

    Ok(ModelReply {
        text: message.content,
        tool_calls,
    }
    .normalized())
}

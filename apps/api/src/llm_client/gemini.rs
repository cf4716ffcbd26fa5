//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    build_http_client, get_json, post_json, trim_base_url, AgentConfig, ChatMessage, ChatModel,
    LlmError, ModelReply, ToolCall, ToolSpec, MAX_OUTPUT_TOKENS,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

impl GeminiClient {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: build_http_client(),
            api_key: config.api_key.clone(),
            base_url: trim_base_url(&config.api_url, DEFAULT_BASE_URL),
            model: config.model.trim_start_matches("models/").to_string(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(&self, system: &str, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": encode_contents(messages),
            "generationConfig": { "maxOutputTokens": MAX_OUTPUT_TOKENS },
        });

        if !tools.is_empty() {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }

    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/models", self.base_url);
        let list: ModelList =
            get_json(&self.client, &url, &[(API_KEY_HEADER, &self.api_key)]).await?;
        Ok(list
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        let body = self.build_body(system, messages, tools);

        let response: GenerateResponse = post_json(
            &self.client,
            &self.generate_url(),
            &[(API_KEY_HEADER, &self.api_key)],
            &body,
        )
        .await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        decode_response(response)
    }
}

/// Maps the neutral conversation onto Gemini `contents`. Consecutive tool results
/// are grouped into a single turn of `functionResponse` parts.
fn encode_contents(messages: &[ChatMessage]) -> Vec<Value> {
    let mut contents: Vec<Value> = Vec::new();
    let mut pending_responses: Vec<Value> = Vec::new();

    for message in messages {
        if let ChatMessage::Tool { name, output, .. } = message {
            // functionResponse.response must be an object
            let response = if output.is_object() {
                output.clone()
            } else {
                json!({ "result": output })
            };
            pending_responses.push(json!({
                "functionResponse": { "name": name, "response": response }
            }));
            continue;
        }

        if !pending_responses.is_empty() {
            contents.push(json!({
                "role": "user",
                "parts": std::mem::take(&mut pending_responses),
            }));
        }

        match message {
            ChatMessage::User(text) => {
                contents.push(json!({ "role": "user", "parts": [{ "text": text }] }));
            }
            ChatMessage::Assistant { text, tool_calls } => {
                let mut parts: Vec<Value> = Vec::new();
                if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
                    parts.push(json!({ "text": text }));
                }
                parts.extend(tool_calls.iter().map(|call| {
                    json!({ "functionCall": { "name": call.name, "args": call.arguments } })
                }));
                contents.push(json!({ "role": "model", "parts": parts }));
            }
            ChatMessage::Tool { .. } => {}
        }
    }

    if !pending_responses.is_empty() {
        contents.push(json!({ "role": "user", "parts": pending_responses }));
    }

    contents
}

fn decode_response(response: GenerateResponse) -> Result<ModelReply, LlmError> {
    // A candidate without content (e.g. stopped by a safety filter) is an empty turn.
    let parts = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyContent)?
        .content
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut texts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for part in parts {
        if let Some(text) = part.text {
            texts.push(text);
        }
        if let Some(call) = part.function_call {
            // Gemini does not assign call ids; synthesize stable ones per turn.
            tool_calls.push(ToolCall {
                id: format!("{}-{}", call.name, tool_calls.len()),
                name: call.name,
                arguments: call.args,
            });
        }
    }

    let text = if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    };

    Ok(ModelReply { text, tool_calls }.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ProviderType;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> AgentConfig {
        AgentConfig {
            provider_type: ProviderType::Gemini,
            api_key: "g-key".to_string(),
            api_url: url.to_string(),
            model: "gemini-2.0-flash".to_string(),
        }
    }

    #[test]
    fn test_generate_url_default_base() {
        let client = GeminiClient::new(&config(""));
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_model_prefix_is_stripped() {
        let mut cfg = config("");
        cfg.model = "models/gemini-1.5-pro".to_string();
        let client = GeminiClient::new(&cfg);
        assert!(client.generate_url().ends_with("/models/gemini-1.5-pro:generateContent"));
    }

    #[test]
    fn test_tool_results_grouped_into_one_turn() {
        let messages = vec![
            ChatMessage::user("sort these"),
            ChatMessage::Assistant {
                text: None,
                tool_calls: vec![
                    ToolCall {
                        id: "a-0".to_string(),
                        name: "a".to_string(),
                        arguments: json!({}),
                    },
                    ToolCall {
                        id: "b-1".to_string(),
                        name: "b".to_string(),
                        arguments: json!({}),
                    },
                ],
            },
            ChatMessage::Tool {
                call_id: "a-0".to_string(),
                name: "a".to_string(),
                output: json!({"valid": true}),
            },
            ChatMessage::Tool {
                call_id: "b-1".to_string(),
                name: "b".to_string(),
                output: json!(false),
            },
        ];

        let contents = encode_contents(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(contents[2]["role"], "user");
        let parts = contents[2]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["functionResponse"]["response"]["result"], false);
    }

    #[test]
    fn test_body_declares_tools() {
        let client = GeminiClient::new(&config(""));
        let tools = vec![ToolSpec {
            name: "validate_ranking".to_string(),
            description: "check".to_string(),
            parameters: json!({"type": "object"}),
        }];
        let body = client.build_body("sys", &[ChatMessage::user("hi")], &tools);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "validate_ranking"
        );
    }

    #[tokio::test]
    async fn test_chat_parses_text_and_function_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [
                    {"text": "Checking. "},
                    {"functionCall": {"name": "validate_json", "args": {"json_string": "{}"}}}
                ]}}],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri()));
        let reply = client
            .chat("sys", &[ChatMessage::user("go")], &[])
            .await
            .unwrap();
        assert_eq!(reply.text.as_deref(), Some("Checking. "));
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "validate_json-0");
        assert_eq!(reply.tool_calls[0].arguments["json_string"], "{}");
    }

    #[tokio::test]
    async fn test_chat_without_candidates_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri()));
        let err = client
            .chat("sys", &[ChatMessage::user("go")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_candidate_without_content_is_an_empty_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "STOP"}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri()));
        let reply = client
            .chat("sys", &[ChatMessage::user("go")], &[])
            .await
            .unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_list_models_strips_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "models/gemini-2.0-flash"}, {"name": "models/gemini-1.5-pro"}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri()));
        let models = client.list_models().await.unwrap();
        assert_eq!(
            models,
            vec!["gemini-2.0-flash".to_string(), "gemini-1.5-pro".to_string()]
        );
    }
}

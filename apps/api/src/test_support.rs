//! Test doubles shared by the pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::llm_client::{
    create_model, AgentConfig, ChatMessage, ChatModel, LlmError, ModelReply, ProviderType,
    ToolSpec,
};
use crate::pipeline::progress::{ProgressEvent, ProgressSink};

/// One request as the scripted model saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

impl RecordedCall {
    /// Text of the first user message, i.e. the stage prompt.
    pub fn prompt(&self) -> &str {
        match self.messages.first() {
            Some(ChatMessage::User(text)) => text,
            _ => "",
        }
    }
}

enum Scripted {
    Reply(ModelReply),
    Fail { status: u16, message: String },
}

/// A `ChatModel` that answers from a fixed script, in order, and records every call.
/// Running past the end of the script panics so a test sees unexpected extra calls.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into_iter().map(Scripted::Reply).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Shorthand for a script of plain-text replies.
    pub fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|t| ModelReply::text(*t)).collect())
    }

    /// A model whose first call fails with a provider error.
    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from([Scripted::Fail {
                status,
                message: message.to_string(),
            }])),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail { status, message }) => Err(LlmError::Api { status, message }),
            None => panic!("ScriptedModel ran out of replies (system prompt: {system:.60})"),
        }
    }
}

#[derive(Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible mock server
// ────────────────────────────────────────────────────────────────────────────

/// A completion whose message carries `content` (which may be empty).
pub fn openai_text(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

/// A completion that calls one tool and carries no text.
pub fn openai_tool_call(id: &str, name: &str, arguments: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": id,
                "type": "function",
                "function": { "name": name, "arguments": arguments.to_string() }
            }]
        } }]
    }))
}

/// Mounts one `/v1/chat/completions` response per call, served in order.
pub async fn mount_completions(server: &MockServer, replies: Vec<ResponseTemplate>) {
    for reply in replies {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(reply)
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

/// A real OpenAI-compatible client pointed at `server`.
pub fn openai_model(server: &MockServer) -> Arc<dyn ChatModel> {
    Arc::new(create_model(&AgentConfig {
        provider_type: ProviderType::OpenAiCompatible,
        api_key: "sk-test".to_string(),
        api_url: format!("{}/v1", server.uri()),
        model: "gpt-4o".to_string(),
    }))
}

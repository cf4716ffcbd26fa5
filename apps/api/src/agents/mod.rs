//! Role Agents — named conversational roles (analyst, writer, reviewer, scribe, editor)
//! bound to a fixed system prompt, an ordered set of validator tools, and a model client.
//!
//! An agent is built fresh for every pipeline run and keeps no state between calls:
//! the only history is the tool-call exchange inside a single `run`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::llm_client::{ChatMessage, ChatModel, LlmError, ToolSpec};
use crate::tools::ValidatorTool;

pub mod review;
pub mod runner;

/// Tool-call rounds allowed before the agent is told to answer.
pub const MAX_TOOL_ROUNDS: usize = 4;

const FINAL_ANSWER_NUDGE: &str =
    "You have used all available tool calls. Reply now with your final answer only.";

/// One tool execution performed during an agent turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
    pub output: Value,
}

/// The result of running an agent: its final (trimmed) text and every tool call it made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTurn {
    pub text: String,
    pub invocations: Vec<ToolInvocation>,
}

impl AgentTurn {
    /// The last invocation of the named tool, if any.
    pub fn last_invocation(&self, name: &str) -> Option<&ToolInvocation> {
        self.invocations.iter().rev().find(|i| i.name == name)
    }
}

pub struct RoleAgent {
    name: &'static str,
    system_prompt: String,
    tools: Vec<Box<dyn ValidatorTool>>,
    model: Arc<dyn ChatModel>,
}

impl RoleAgent {
    pub fn new(
        name: &'static str,
        system_prompt: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            model,
        }
    }

    pub fn with_tool(mut self, tool: impl ValidatorTool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    fn execute_tool(&self, name: &str, input: &Value) -> Value {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.call(input),
            None => json!({ "error": format!("Unknown tool '{name}'") }),
        }
    }

    /// Sends `prompt` and serves tool calls until the model answers with text.
    ///
    /// After `MAX_TOOL_ROUNDS` rounds of tool calls the model is asked once more for
    /// a final answer; whatever text it returns is used, even if empty.
    pub async fn run(&self, prompt: &str) -> Result<AgentTurn, LlmError> {
        let specs: Vec<ToolSpec> = self.tools.iter().map(|t| t.spec()).collect();
        let mut messages = vec![ChatMessage::user(prompt)];
        let mut invocations: Vec<ToolInvocation> = Vec::new();

        for _round in 0..MAX_TOOL_ROUNDS {
            let reply = self
                .model
                .chat(&self.system_prompt, &messages, &specs)
                .await?;

            if reply.tool_calls.is_empty() {
                if reply.is_empty() {
                    debug!(agent = self.name, "Model returned an empty turn");
                }
                return Ok(AgentTurn {
                    text: reply.text.unwrap_or_default().trim().to_string(),
                    invocations,
                });
            }

            messages.push(ChatMessage::Assistant {
                text: reply.text.clone(),
                tool_calls: reply.tool_calls.clone(),
            });

            for call in reply.tool_calls {
                let output = self.execute_tool(&call.name, &call.arguments);
                debug!(
                    agent = self.name,
                    tool = %call.name,
                    valid = ?output.get("valid"),
                    "Tool call served"
                );
                messages.push(ChatMessage::Tool {
                    call_id: call.id,
                    name: call.name.clone(),
                    output: output.clone(),
                });
                invocations.push(ToolInvocation {
                    name: call.name,
                    input: call.arguments,
                    output,
                });
            }
        }

        messages.push(ChatMessage::user(FINAL_ANSWER_NUDGE));
        let reply = self
            .model
            .chat(&self.system_prompt, &messages, &specs)
            .await?;

        Ok(AgentTurn {
            text: reply.text.unwrap_or_default().trim().to_string(),
            invocations,
        })
    }
}

//! Natural-language chat over the tool catalog, backed by a local Ollama
//! model. Tool calls requested by the model go through the same
//! [`ToolGateway`] the MCP server uses.

mod message;
mod ollama;
mod session;

pub use message::{ChatMessage, FunctionCall, Role, ToolCall};
pub use ollama::{model_matches, ChatChunk, OllamaClient};
pub use session::{InMemorySessionStore, SessionStore};

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::ChatConfig;
use crate::mcp::{ToolGateway, ToolName, ToolRequest};
use crate::search::SearchContext;
use crate::QRadarError;

pub const SYSTEM_PROMPT: &str = "You are a security analyst assistant with access to IBM QRadar SIEM through tools.

You can:
- Investigate offenses: list, inspect, read and add notes, change status, assign
- Search events and flows with AQL, or pull the most recent events
- Look up log sources, assets, reference sets, rules and building blocks
- Explore Ariel databases, fields and event categories to write correct AQL
- Review system information, servers, domains, users and installed apps

Guidelines:
1. Call a tool whenever the answer depends on live QRadar data.
2. Prefer narrow filters and small ranges over large unfiltered lists.
3. Before writing AQL, check field names with the Ariel tools.
4. Never close or reassign an offense unless the user asked for it.
5. Summarize results for an analyst: what matters, what to check next.

Be concise but thorough. Focus on security value.";

/// Tool output longer than this is cut before going back to the model.
const MAX_TOOL_OUTPUT_CHARS: usize = 12_000;

/// One tool the model called while answering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

/// Incremental output of a streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Delta(String),
    ToolCall(ToolInvocation),
    /// Final assistant text, also stored in the session.
    Done(String),
}

/// Catalog entries in Ollama's function-tool format.
pub fn ollama_tools() -> Vec<Value> {
    ToolName::ALL
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.as_str(),
                    "description": tool.description(),
                    "parameters": Value::Object(tool.input_schema().as_ref().clone()),
                }
            })
        })
        .collect()
}

fn truncate_output(mut text: String) -> String {
    if text.chars().count() <= MAX_TOOL_OUTPUT_CHARS {
        return text;
    }
    let cut = text
        .char_indices()
        .nth(MAX_TOOL_OUTPUT_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.truncate(cut);
    text.push_str("\n... (truncated)");
    text
}

pub struct ChatService {
    llm: OllamaClient,
    gateway: ToolGateway,
    store: Arc<dyn SessionStore>,
    config: ChatConfig,
    tools: Vec<Value>,
}

impl ChatService {
    pub fn new(
        llm: OllamaClient,
        gateway: ToolGateway,
        store: Arc<dyn SessionStore>,
        config: ChatConfig,
    ) -> Self {
        Self {
            llm,
            gateway,
            store,
            config,
            tools: ollama_tools(),
        }
    }

    pub fn llm(&self) -> &OllamaClient {
        &self.llm
    }

    pub async fn clear(&self, session_id: &str) {
        self.store.clear(session_id).await;
    }

    async fn prompt(&self, session_id: Option<&str>, input: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        if let Some(id) = session_id {
            messages.extend(self.store.history(id).await);
        }
        messages.push(ChatMessage::user(input));
        messages
    }

    /// Tools offered on the given round; the last round has none so the
    /// model must answer in text.
    fn tools_for_round(&self, round: usize) -> &[Value] {
        if round < self.config.max_tool_rounds {
            &self.tools
        } else {
            &[]
        }
    }

    async fn invoke(&self, call: &ToolCall) -> (ToolInvocation, ChatMessage) {
        let name = call.function.name.clone();
        debug!(tool = %name, "Model requested tool");
        let response = self
            .gateway
            .dispatch(
                ToolRequest::new(name.clone(), call.function.arguments()),
                &SearchContext::default(),
            )
            .await;
        let invocation = ToolInvocation {
            name: name.clone(),
            success: response.success,
            message: response.message.clone(),
        };
        (
            invocation,
            ChatMessage::tool(name, truncate_output(response.to_text())),
        )
    }

    async fn complete(&self, mut messages: Vec<ChatMessage>) -> Result<ChatReply, QRadarError> {
        let mut invocations = Vec::new();
        let mut round = 0;
        loop {
            let reply = self.llm.chat(&messages, self.tools_for_round(round)).await?;
            if reply.tool_calls.is_empty() || round >= self.config.max_tool_rounds {
                return Ok(ChatReply {
                    content: reply.content,
                    tool_calls: invocations,
                });
            }
            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let (invocation, result) = self.invoke(call).await;
                invocations.push(invocation);
                messages.push(result);
            }
            round += 1;
        }
    }

    /// Answer one message in a session, running any tool calls first.
    #[instrument(name = "chat.send", skip_all, fields(session = %session_id))]
    pub async fn send(&self, session_id: &str, input: &str) -> Result<ChatReply, QRadarError> {
        let messages = self.prompt(Some(session_id), input).await;
        let reply = self.complete(messages).await?;
        self.store
            .append(
                session_id,
                vec![
                    ChatMessage::user(input),
                    ChatMessage::assistant(reply.content.clone()),
                ],
            )
            .await;
        Ok(reply)
    }

    /// Answer a single question without reading or writing history.
    pub async fn ask(&self, input: &str) -> Result<ChatReply, QRadarError> {
        let messages = self.prompt(None, input).await;
        self.complete(messages).await
    }

    /// Like [`send`](Self::send), yielding text as the model produces it.
    pub fn send_streaming<'a>(
        &'a self,
        session_id: &'a str,
        input: &'a str,
    ) -> impl Stream<Item = Result<ChatEvent, QRadarError>> + 'a {
        try_stream! {
            let mut messages = self.prompt(Some(session_id), input).await;
            let mut round = 0;
            let answer = loop {
                let mut chunks = self
                    .llm
                    .chat_stream(&messages, self.tools_for_round(round))
                    .await?;
                let mut content = String::new();
                let mut calls = Vec::new();
                while let Some(chunk) = chunks.next().await {
                    let Some(message) = chunk?.message else { continue };
                    if !message.content.is_empty() {
                        content.push_str(&message.content);
                        yield ChatEvent::Delta(message.content);
                    }
                    calls.extend(message.tool_calls);
                }
                if calls.is_empty() || round >= self.config.max_tool_rounds {
                    break content;
                }
                let mut assistant = ChatMessage::assistant(content);
                assistant.tool_calls = calls.clone();
                messages.push(assistant);
                for call in &calls {
                    let (invocation, result) = self.invoke(call).await;
                    yield ChatEvent::ToolCall(invocation);
                    messages.push(result);
                }
                round += 1;
            };
            self.store
                .append(
                    session_id,
                    vec![ChatMessage::user(input), ChatMessage::assistant(answer.clone())],
                )
                .await;
            yield ChatEvent::Done(answer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_tools_cover_catalog() {
        let tools = ollama_tools();
        assert_eq!(tools.len(), ToolName::ALL.len());
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_truncate_output() {
        let short = "x".repeat(10);
        assert_eq!(truncate_output(short.clone()), short);
        let long = "é".repeat(MAX_TOOL_OUTPUT_CHARS + 5);
        let cut = truncate_output(long);
        assert!(cut.ends_with("(truncated)"));
        assert!(cut.starts_with("é"));
    }

    #[test]
    fn test_system_prompt_mentions_guidelines() {
        assert!(SYSTEM_PROMPT.contains("security analyst assistant"));
        assert!(SYSTEM_PROMPT.ends_with("Focus on security value."));
    }
}

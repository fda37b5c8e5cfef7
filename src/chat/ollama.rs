//! Minimal Ollama `/api` client: model listing and chat with tools.

use std::pin::Pin;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::message::ChatMessage;
use crate::config::ChatConfig;
use crate::QRadarError;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, QRadarError>> + Send>>;

/// One line of a `/api/chat` response. Non-streaming replies are a single
/// chunk with `done = true`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// True when an installed tag satisfies the requested model, either by
/// containment or by sharing the family before `:`.
pub fn model_matches(requested: &str, installed: &str) -> bool {
    let family = requested.split(':').next().unwrap_or(requested);
    installed.contains(requested) || installed.starts_with(family)
}

#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl OllamaClient {
    pub fn new(config: ChatConfig) -> Result<Self, QRadarError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| QRadarError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.ollama_url, path)
    }

    fn map_error(&self, err: reqwest::Error) -> QRadarError {
        if err.is_timeout() {
            QRadarError::Llm("Request timed out. Try a simpler query or a faster model.".into())
        } else if err.is_connect() {
            QRadarError::Llm(format!(
                "Cannot connect to Ollama at {}. Is it running? Start with: ollama serve",
                self.config.ollama_url
            ))
        } else {
            QRadarError::Llm(err.to_string())
        }
    }

    /// Names of locally installed models.
    pub async fn list_models(&self) -> Result<Vec<String>, QRadarError> {
        let response = self
            .http
            .get(self.url("tags"))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        if !response.status().is_success() {
            return Err(QRadarError::Llm(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }
        let tags: TagsResponse = response.json().await.map_err(|e| self.map_error(e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Fail with a pull hint unless the configured model is installed.
    pub async fn ensure_model(&self) -> Result<(), QRadarError> {
        let models = self.list_models().await?;
        if models.iter().any(|m| model_matches(&self.config.model, m)) {
            return Ok(());
        }
        let available = if models.is_empty() {
            "none".to_string()
        } else {
            models.join(", ")
        };
        Err(QRadarError::Llm(format!(
            "Model '{}' not found (available: {}). Pull it with: ollama pull {}",
            self.config.model, available, self.config.model
        )))
    }

    fn body(&self, messages: &[ChatMessage], tools: &[Value], stream: bool) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": stream,
            "options": {
                "temperature": self.config.temperature,
                "num_ctx": self.config.num_ctx,
            },
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
        }
        body
    }

    async fn post_chat(&self, body: Value) -> Result<reqwest::Response, QRadarError> {
        let response = self
            .http
            .post(self.url("chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(QRadarError::Llm(format!(
                "Ollama returned status {}: {}",
                status, text
            )));
        }
        Ok(response)
    }

    /// One complete assistant message.
    #[instrument(name = "ollama.chat", skip_all, fields(model = %self.config.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChatMessage, QRadarError> {
        let response = self.post_chat(self.body(messages, tools, false)).await?;
        let chunk: ChatChunk = response.json().await.map_err(|e| self.map_error(e))?;
        if let Some(error) = chunk.error {
            return Err(QRadarError::Llm(error));
        }
        chunk
            .message
            .ok_or_else(|| QRadarError::Llm("Ollama reply had no message".into()))
    }

    /// Streamed assistant message, one chunk per NDJSON line, ending at
    /// the first chunk marked `done`.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChunkStream, QRadarError> {
        let response = self.post_chat(self.body(messages, tools, true)).await?;
        let client = self.clone();
        let mut bytes = response.bytes_stream();

        let stream = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            'read: while let Some(piece) = bytes.next().await {
                let piece = piece.map_err(|e| client.map_error(e))?;
                buffer.extend_from_slice(&piece);
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(chunk) = parse_line(&line)? {
                        let done = chunk.done;
                        yield chunk;
                        if done {
                            break 'read;
                        }
                    }
                }
            }
            if let Some(chunk) = parse_line(&buffer)? {
                yield chunk;
            }
        };
        Ok(Box::pin(stream))
    }
}

fn parse_line(line: &[u8]) -> Result<Option<ChatChunk>, QRadarError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let chunk: ChatChunk = serde_json::from_str(text).map_err(|e| {
        debug!("Unparseable stream line: {}", text);
        QRadarError::Llm(format!("Malformed stream chunk: {}", e))
    })?;
    match chunk.error {
        Some(error) => Err(QRadarError::Llm(error)),
        None => Ok(Some(chunk)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_matching() {
        assert!(model_matches("llama3.1:8b", "llama3.1:8b"));
        assert!(model_matches("llama3.1:8b", "llama3.1:latest"));
        assert!(model_matches("mistral", "mistral:7b"));
        assert!(!model_matches("llama3.1:8b", "mistral:7b"));
    }

    #[test]
    fn test_parse_line_skips_blank_and_surfaces_errors() {
        assert!(parse_line(b"  \n").unwrap().is_none());
        let err = parse_line(br#"{"error": "model not loaded"}"#).unwrap_err();
        assert_eq!(err.to_string(), "LLM error: model not loaded");
        let chunk = parse_line(br#"{"message": {"role": "assistant", "content": "hi"}, "done": false}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.message.unwrap().content, "hi");
    }

    #[test]
    fn test_body_omits_empty_tools() {
        let client = OllamaClient::new(ChatConfig::default()).unwrap();
        let body = client.body(&[ChatMessage::user("hi")], &[], false);
        assert!(body.get("tools").is_none());
        assert_eq!(body["options"]["num_ctx"], 4096);
        assert_eq!(body["stream"], false);
    }
}

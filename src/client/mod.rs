//! Chat-completion backend boundary.
//!
//! The runtime drives completions only through [`CompletionClient`], so the
//! concrete backend (and its wire format) stays replaceable; [`http`]
//! provides the production reqwest + SSE implementation.

pub mod http;

pub use http::HttpCompletionClient;

use crate::types::message::{Attachment, ChatMessage};
use crate::{BoxStream, Result};
use serde::Deserialize;

/// A streaming chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Remote deployment identifier the request is routed to.
    pub deployment: String,
    pub stream: bool,
    /// Extra configuration fields forwarded verbatim to the deployment.
    pub configuration: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(deployment: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            deployment: deployment.into(),
            stream: true,
            configuration: None,
        }
    }

    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// One increment of a streamed completion response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<MessageDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub custom_content: Option<CustomContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomContent {
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Incremental sequence of completion chunks.
pub type ChunkStream = BoxStream<'static, ChatChunk>;

/// Boundary trait for the chat-completion backend.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a streaming completion. Credentials are per call: tools forward
    /// the caller's key from `ToolCallParams`.
    async fn stream_chat(&self, request: CompletionRequest, api_key: &str) -> Result<ChunkStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_deserializes_text_delta() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#).unwrap();
        let delta = chunk.choices[0].delta.as_ref().unwrap();
        assert_eq!(delta.content.as_deref(), Some("Hello"));
        assert!(delta.custom_content.is_none());
    }

    #[test]
    fn test_chunk_deserializes_attachment_delta() {
        let raw = r#"{"choices":[{"delta":{"custom_content":{"attachments":[{"type":"image/png","title":"plot","url":"files/home/plot.png"}]}}}]}"#;
        let chunk: ChatChunk = serde_json::from_str(raw).unwrap();
        let delta = chunk.choices[0].delta.as_ref().unwrap();
        let attachments = &delta.custom_content.as_ref().unwrap().attachments;
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].title.as_deref(), Some("plot"));
    }

    #[test]
    fn test_empty_chunk_is_valid() {
        let chunk: ChatChunk = serde_json::from_str("{}").unwrap();
        assert!(chunk.choices.is_empty());
    }
}

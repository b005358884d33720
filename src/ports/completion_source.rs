//! Completion Source Port - Interface for the language-model API.
//!
//! Two modes are offered:
//!
//! - `generate` returns the finished text in one piece
//! - `stream` returns a lazy sequence of chunks, one per upstream event
//!
//! Chunks mirror the upstream event shape: zero or more choices, each with
//! an optional text delta and an optional finish reason. A choice with a
//! finish reason marks the terminal batch.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Lazy, single-pass, finite sequence of completion chunks.
///
/// No network I/O happens until the stream is first polled.
pub type FragmentStream =
    Pin<Box<dyn Stream<Item = Result<CompletionChunk, CompletionError>> + Send>>;

/// Port for the completion API.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Generates the whole reply at once.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamFailure` on any failure. No partial text is returned.
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Starts a streamed generation.
    fn stream(&self, request: CompletionRequest) -> FragmentStream;
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// Prepended as a system message when set.
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Single-turn request for one user prompt.
    pub fn for_prompt(prompt: impl Into<String>) -> Self {
        Self::new().with_message(Message::user(prompt))
    }

    /// Multi-turn request from a caller-supplied history.
    pub fn from_history(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::new()
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Messages as sent upstream, system prompt first.
    pub fn wire_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One upstream streaming event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl CompletionChunk {
    /// Chunk with a single content delta.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
        }
    }

    /// Terminal chunk with the given finish reason and no content.
    pub fn finished(reason: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta::default(),
                finish_reason: Some(reason.into()),
            }],
        }
    }

    /// Chunk with no choices (keep-alive or filter results).
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChunkChoice {
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Completion API errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The completion API call failed or returned something unusable.
    #[error("upstream failure{}: {message}", status_suffix(.status))]
    UpstreamFailure {
        /// HTTP status when the API answered at all.
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl CompletionError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamFailure { status, .. } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder_works() {
        let request = CompletionRequest::for_prompt("Hello")
            .with_system_prompt("Be helpful")
            .with_max_tokens(4000)
            .with_temperature(0.7);

        assert_eq!(request.messages, vec![Message::user("Hello")]);
        assert_eq!(request.system_prompt.as_deref(), Some("Be helpful"));
        assert_eq!(request.max_tokens, Some(4000));
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn wire_messages_put_system_prompt_first() {
        let request = CompletionRequest::from_history(vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you"),
        ])
        .with_system_prompt("sys");

        let wire = request.wire_messages();
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0], Message::system("sys"));
        assert_eq!(wire[3], Message::user("how are you"));
    }

    #[test]
    fn chunk_deserializes_upstream_shape() {
        let chunk: CompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "delta": { "content": "Hel" }, "finish_reason": null }
            ]
        }))
        .unwrap();

        assert_eq!(chunk, CompletionChunk::content("Hel"));
        assert!(!chunk.choices[0].is_terminal());
    }

    #[test]
    fn chunk_without_choices_is_empty() {
        let chunk: CompletionChunk = serde_json::from_value(json!({
            "prompt_filter_results": []
        }))
        .unwrap();
        assert_eq!(chunk, CompletionChunk::empty());
    }

    #[test]
    fn finished_chunk_is_terminal() {
        let chunk = CompletionChunk::finished("stop");
        assert!(chunk.choices[0].is_terminal());
        assert!(chunk.choices[0].delta.content.is_none());
    }

    #[test]
    fn error_display_includes_status_when_known() {
        assert_eq!(
            CompletionError::with_status(429, "slow down").to_string(),
            "upstream failure (429): slow down"
        );
        assert_eq!(
            CompletionError::upstream("connection reset").to_string(),
            "upstream failure: connection reset"
        );
    }
}

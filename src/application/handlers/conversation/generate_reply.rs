//! GenerateReplyHandler - single-shot completions.

use std::sync::Arc;

use crate::ports::{CompletionError, CompletionRequest, CompletionSource, Message};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant integrated with Microsoft Teams.";

/// Model parameters applied to every request the bot makes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplySettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

impl ReplySettings {
    /// Request answering a single user prompt.
    pub fn request_for(&self, prompt: impl Into<String>) -> CompletionRequest {
        self.apply(CompletionRequest::for_prompt(prompt))
    }

    /// Request continuing a caller-supplied conversation.
    pub fn request_with_history(&self, messages: Vec<Message>) -> CompletionRequest {
        self.apply(CompletionRequest::from_history(messages))
    }

    fn apply(&self, request: CompletionRequest) -> CompletionRequest {
        request
            .with_system_prompt(self.system_prompt.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

/// Command to generate a complete reply.
#[derive(Debug, Clone)]
pub struct GenerateReplyCommand {
    pub prompt: String,
}

/// Handler for non-streamed replies.
pub struct GenerateReplyHandler {
    completions: Arc<dyn CompletionSource>,
    settings: ReplySettings,
}

impl GenerateReplyHandler {
    pub fn new(completions: Arc<dyn CompletionSource>, settings: ReplySettings) -> Self {
        Self {
            completions,
            settings,
        }
    }

    /// Returns the whole reply or `UpstreamFailure`. Never partial text.
    pub async fn handle(&self, cmd: GenerateReplyCommand) -> Result<String, CompletionError> {
        self.completions
            .generate(self.settings.request_for(cmd.prompt))
            .await
    }

    /// Same as `handle`, for a multi-turn history.
    pub async fn handle_with_history(&self, messages: Vec<Message>) -> Result<String, CompletionError> {
        self.completions
            .generate(self.settings.request_with_history(messages))
            .await
    }
}

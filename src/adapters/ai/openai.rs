//! OpenAI Completion Source - `CompletionSource` over the chat completions API.
//!
//! Works against OpenAI directly or against an Azure OpenAI deployment.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-5-chat")
//!     .with_azure_base_url("https://contoso.openai.azure.com/openai/v1");
//!
//! let source = OpenAICompletionSource::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Streamed requests are opened lazily on the first poll. The response body
//! is decoded as server-sent events until the `[DONE]` marker.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    CompletionError, CompletionRequest, CompletionSource, FragmentStream, Message, MessageRole,
};

use super::sse::decode_chunks;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI completion source.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    pub model: String,
    /// When set, requests go to this Azure OpenAI endpoint instead.
    pub azure_base_url: Option<String>,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-5-chat".to_string(),
            azure_base_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Switches to Azure mode. Empty strings are ignored.
    pub fn with_azure_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.azure_base_url = (!url.trim().is_empty()).then_some(url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_azure(&self) -> bool {
        self.azure_base_url.is_some()
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Completion source backed by the chat completions endpoint.
#[derive(Clone)]
pub struct OpenAICompletionSource {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAICompletionSource {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built (TLS backend unavailable).
    pub fn new(config: OpenAIConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::upstream(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        let base = self
            .config
            .azure_base_url
            .as_deref()
            .unwrap_or(OPENAI_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn to_api_request(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        ApiRequest {
            model: self.config.model.clone(),
            messages: request.wire_messages().iter().map(ApiMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.bearer_auth(self.config.api_key());
        if self.config.is_azure() {
            builder.header("api-key", self.config.api_key())
        } else {
            builder
        }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response, CompletionError> {
        let body = self.to_api_request(request, stream);

        let response = self
            .authorize(self.client.post(self.completions_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::upstream(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    CompletionError::upstream(format!("request failed: {}", e))
                }
            })?;

        check_status(response).await
    }
}

/// Maps non-success statuses to `UpstreamFailure`, keeping the API's
/// error message when it sends one.
async fn check_status(response: Response) -> Result<Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CompletionError::with_status(status.as_u16(), error_message(&body)))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl CompletionSource for OpenAICompletionSource {
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let response = self.send(&request, false).await?;

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::upstream(format!("failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::upstream("response contained no message content"))
    }

    fn stream(&self, request: CompletionRequest) -> FragmentStream {
        let source = self.clone();
        let open = async move { source.send(&request, true).await };

        Box::pin(stream::once(open).flat_map(|opened| match opened {
            Ok(response) => decode_chunks(response.bytes_stream()).boxed(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to open completion stream");
                stream::once(async move { Err(e) }).boxed()
            }
        }))
    }
}

// ----- Chat Completions API Types -----

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            },
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

//! OpenAI-compatible chat provider.
//!
//! Talks to any endpoint that implements the OpenAI chat-completions API.
//! Mistral and OpenAI are provided as presets; other compatible services
//! work by overriding the base URL and model.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAICompatibleConfig::mistral(api_key)
//!     .with_model("mistral-small-latest")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let provider = OpenAICompatibleProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Uses Server-Sent Events. Network chunks may split an event anywhere, so
//! incoming bytes are buffered and only complete `data:` lines are parsed.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    MessageRole, ProviderInfo, ResponseFormat, StreamChunk, TokenUsage,
};

pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const MISTRAL_DEFAULT_MODEL: &str = "mistral-small-latest";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Known API flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPreset {
    Mistral,
    OpenAI,
}

impl ProviderPreset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mistral => "mistral",
            Self::OpenAI => "openai",
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            Self::Mistral => MISTRAL_BASE_URL,
            Self::OpenAI => OPENAI_BASE_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Mistral => MISTRAL_DEFAULT_MODEL,
            Self::OpenAI => OPENAI_DEFAULT_MODEL,
        }
    }

    /// Only OpenAI understands `stream_options`; Mistral sends usage
    /// with the last chunk unasked.
    fn wants_stream_options(&self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

/// Configuration for the provider.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    api_key: Secret<String>,
    pub preset: ProviderPreset,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Retries on transient failures. Zero means one attempt.
    pub max_retries: u32,
}

impl OpenAICompatibleConfig {
    pub fn new(preset: ProviderPreset, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            preset,
            model: preset.default_model().to_string(),
            base_url: preset.base_url().to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 0,
        }
    }

    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::new(ProviderPreset::Mistral, api_key)
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(ProviderPreset::OpenAI, api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    client: Client,
}

impl OpenAICompatibleProvider {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to the wire format.
    fn to_wire_request(&self, request: &CompletionRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref prompt) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }
        for msg in &request.messages {
            messages.push(ChatMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: Some(stream),
            stream_options: (stream && self.config.preset.wants_stream_options())
                .then_some(StreamOptions { include_usage: true }),
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(WireResponseFormat {
                    kind: "json_object".to_string(),
                }),
            },
        }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response, AIError> {
        let body = self.to_wire_request(request, stream);
        tracing::debug!(
            provider = self.config.preset.name(),
            model = %self.config.model,
            purpose = request.metadata.purpose.as_str(),
            trace_id = %request.metadata.trace_id,
            stream,
            "sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::timeout(self.config.timeout.as_secs() as u32)
                } else if e.is_connect() {
                    AIError::network(format!("connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })?;
        Self::check_status(response).await
    }

    /// Maps non-success statuses to errors.
    async fn check_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 if error_body.contains("context_length_exceeded")
                || error_body.contains("maximum context length") =>
            {
                Err(AIError::context_too_long(0, 0))
            }
            400 | 422 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Reads "try again in Ns" from an error body, 30 seconds otherwise.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_default();
        message
            .find("try again in ")
            .map(|idx| &message[idx + "try again in ".len()..])
            .and_then(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    async fn parse_response(response: Response) -> Result<CompletionResponse, AIError> {
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("failed to parse response: {}", e)))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("no choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            usage: body
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
                .unwrap_or_default(),
            model: body.model,
            finish_reason: finish_reason(choice.finish_reason.as_deref()),
        })
    }

    async fn complete_once(&self, request: &CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send(request, false).await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl AIProvider for OpenAICompatibleProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut attempt = 0;
        loop {
            match self.complete_once(&request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1 << attempt.min(5));
                    tracing::warn!(error = %err, attempt, ?delay, "completion failed; retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let response = self.send(&request, true).await?;

        let stream = response
            .bytes_stream()
            .scan(SseBuffer::default(), |buffer, chunk| {
                let parsed = match chunk {
                    Ok(bytes) => buffer.push(&String::from_utf8_lossy(&bytes)),
                    Err(e) => vec![Err(AIError::network(format!("stream error: {}", e)))],
                };
                futures::future::ready(Some(parsed))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 characters per token
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 128_000,
            m if m.starts_with("gpt-3.5") => 16_385,
            m if m.starts_with("mistral-large") || m.starts_with("mistral-small") => 128_000,
            m if m.starts_with("open-mistral") => 32_000,
            _ => 32_000,
        };
        ProviderInfo::new(self.config.preset.name(), &self.config.model, max_context)
            .with_streaming(true)
            .with_json_mode(true)
    }
}

fn finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") | Some("model_length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("error") => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}

/// Accumulates SSE text until full lines are available.
#[derive(Debug, Default)]
struct SseBuffer {
    pending: String,
}

impl SseBuffer {
    fn push(&mut self, text: &str) -> Vec<Result<StreamChunk, AIError>> {
        self.pending.push_str(text);
        let Some(end) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let complete: String = self.pending.drain(..=end).collect();
        parse_sse_lines(&complete)
    }
}

/// Parses complete SSE lines into stream chunks.
fn parse_sse_lines(text: &str) -> Vec<Result<StreamChunk, AIError>> {
    let mut results = Vec::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data:").map(str::trim) else {
            continue;
        };
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => {
                let usage = chunk
                    .usage
                    .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));
                let Some(choice) = chunk.choices.into_iter().next() else {
                    continue;
                };
                if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                    results.push(Ok(StreamChunk::content(content)));
                }
                if choice.finish_reason.is_some() {
                    let finish = finish_reason(choice.finish_reason.as_deref());
                    results.push(Ok(StreamChunk::final_chunk(finish, usage)));
                }
            }
            Err(e) => results.push(Err(AIError::parse(format!("failed to parse SSE chunk: {}", e)))),
        }
    }

    results
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

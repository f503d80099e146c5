//! Mock AI Provider for testing and offline runs.
//!
//! # Features
//!
//! - Queued responses, consumed in order
//! - Per-purpose queues, so one provider can serve the question generator,
//!   classifier and extractor adapters in the same test
//! - Error injection and simulated latency
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_purpose_response(RequestPurpose::RoleClassification, r#"{"candidates":[]}"#)
//!     .with_response("Welche Systeme nutzen Sie?");
//! ```

use async_trait::async_trait;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, RequestPurpose, StreamChunk, TokenUsage,
};

const DEFAULT_CONTENT: &str = "Mock response";

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success {
        content: String,
        finish_reason: FinishReason,
    },
    Error(AIError),
}

#[derive(Debug, Default)]
struct Queues {
    any: VecDeque<MockResponse>,
    by_purpose: HashMap<RequestPurpose, VecDeque<MockResponse>>,
}

#[derive(Debug, Clone)]
pub struct MockAIProvider {
    queues: Arc<Mutex<Queues>>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(Queues::default())),
            info: ProviderInfo::new("mock", "mock-model-1", 32_000).with_json_mode(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful response for any purpose.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(None, MockResponse::Success {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Queues a response served only to requests with this purpose.
    pub fn with_purpose_response(self, purpose: RequestPurpose, content: impl Into<String>) -> Self {
        self.push(Some(purpose), MockResponse::Success {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    pub fn with_error(self, error: AIError) -> Self {
        self.push(None, MockResponse::Error(error))
    }

    pub fn with_purpose_error(self, purpose: RequestPurpose, error: AIError) -> Self {
        self.push(Some(purpose), MockResponse::Error(error))
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of recorded calls with the given purpose.
    pub fn calls_for(&self, purpose: RequestPurpose) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.metadata.purpose == purpose)
            .count()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn push(self, purpose: Option<RequestPurpose>, response: MockResponse) -> Self {
        {
            let mut queues = lock(&self.queues);
            match purpose {
                Some(purpose) => queues.by_purpose.entry(purpose).or_default().push_back(response),
                None => queues.any.push_back(response),
            }
        }
        self
    }

    /// Purpose queue first, then the shared queue, then a default reply.
    fn next_response(&self, purpose: RequestPurpose) -> MockResponse {
        let mut queues = lock(&self.queues);
        queues
            .by_purpose
            .get_mut(&purpose)
            .and_then(VecDeque::pop_front)
            .or_else(|| queues.any.pop_front())
            .unwrap_or_else(|| MockResponse::Success {
                content: DEFAULT_CONTENT.to_string(),
                finish_reason: FinishReason::Stop,
            })
    }

    async fn record(&self, request: CompletionRequest) -> MockResponse {
        let purpose = request.metadata.purpose;
        lock(&self.calls).push(request);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.next_response(purpose)
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let prompt_tokens = self.estimate_tokens(&request.system_prompt.clone().unwrap_or_default());
        match self.record(request).await {
            MockResponse::Success {
                content,
                finish_reason,
            } => Ok(CompletionResponse {
                usage: TokenUsage::new(prompt_tokens, self.estimate_tokens(&content)),
                content,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::Error(err) => Err(err),
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        match self.record(request).await {
            MockResponse::Success {
                content,
                finish_reason,
            } => {
                // Word-sized chunks that concatenate back to the content.
                let mut chunks: Vec<Result<StreamChunk, AIError>> = content
                    .split_inclusive(' ')
                    .map(|part| Ok(StreamChunk::content(part)))
                    .collect();
                let usage = TokenUsage::new(0, self.estimate_tokens(&content));
                chunks.push(Ok(StreamChunk::final_chunk(finish_reason, Some(usage))));
                Ok(Box::pin(stream::iter(chunks)))
            }
            MockResponse::Error(err) => Err(err),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 characters per token
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MessageRole, RequestMetadata};
    use futures::StreamExt;

    fn request(purpose: RequestPurpose) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(purpose)).with_message(MessageRole::User, "Hallo")
    }

    #[tokio::test]
    async fn returns_responses_in_order_then_default() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");
        let purpose = RequestPurpose::QuestionGeneration;

        assert_eq!(provider.complete(request(purpose)).await.unwrap().content, "First");
        assert_eq!(provider.complete(request(purpose)).await.unwrap().content, "Second");
        assert_eq!(provider.complete(request(purpose)).await.unwrap().content, DEFAULT_CONTENT);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn purpose_queue_takes_precedence() {
        let provider = MockAIProvider::new()
            .with_response("shared")
            .with_purpose_response(RequestPurpose::RoleClassification, "{\"candidates\":[]}");

        let classification = provider
            .complete(request(RequestPurpose::RoleClassification))
            .await
            .unwrap();
        let question = provider
            .complete(request(RequestPurpose::QuestionGeneration))
            .await
            .unwrap();

        assert_eq!(classification.content, "{\"candidates\":[]}");
        assert_eq!(question.content, "shared");
        assert_eq!(provider.calls_for(RequestPurpose::RoleClassification), 1);
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let provider = MockAIProvider::new().with_error(AIError::rate_limited(30));
        let err = provider
            .complete(request(RequestPurpose::FieldExtraction))
            .await
            .unwrap_err();
        assert_eq!(err, AIError::rate_limited(30));
    }

    #[tokio::test]
    async fn streaming_chunks_rebuild_content() {
        let provider = MockAIProvider::new().with_response("Wie gross ist Ihr Team?");
        let mut stream = provider
            .stream_complete(request(RequestPurpose::QuestionGeneration))
            .await
            .unwrap();

        let mut content = String::new();
        let mut finished = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            if chunk.is_final() {
                finished = true;
            } else {
                content.push_str(&chunk.delta);
            }
        }
        assert!(finished);
        assert_eq!(content, "Wie gross ist Ihr Team?");
    }

    #[tokio::test]
    async fn streaming_error_fails_before_stream() {
        let provider = MockAIProvider::new().with_error(AIError::unavailable("down"));
        let result = provider
            .stream_complete(request(RequestPurpose::QuestionGeneration))
            .await;
        assert!(matches!(result, Err(AIError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn clear_calls_resets_history() {
        let provider = MockAIProvider::new();
        provider.complete(request(RequestPurpose::QuestionGeneration)).await.unwrap();
        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn respects_delay() {
        let provider = MockAIProvider::new().with_delay(Duration::from_millis(30));
        let start = std::time::Instant::now();
        provider.complete(request(RequestPurpose::QuestionGeneration)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the interview domain and the outside world. Adapters implement them.
//!
//! ## Inference Ports
//!
//! - `QuestionGenerator` - Wording for the next question
//! - `RoleInference` - Raw role scores from discovery answers
//! - `FieldInference` - Extra schema fields from one answer
//! - `ContextRetriever` - Optional background snippet
//! - `DocumentGenerator` - Process documentation from a finished interview
//!
//! ## Infrastructure Ports
//!
//! - `AIProvider` - Chat completions, used by the LLM-backed adapters
//! - `SessionRepository` - Session persistence

mod ai_provider;
mod context_retriever;
mod document_generator;
mod field_inference;
mod question_generator;
mod role_inference;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, RequestPurpose, ResponseFormat, StreamChunk,
    TokenUsage,
};
pub use context_retriever::ContextRetriever;
pub use document_generator::{DocumentError, DocumentGenerator, DocumentRequest};
pub use field_inference::{ExtractionError, FieldInference};
pub use question_generator::{
    GenerationError, QuestionChunk, QuestionGenerator, QuestionRequest, QuestionStream, QuestionTarget,
};
pub use role_inference::{ClassificationError, RoleInference};
pub use session_repository::{SessionRepository, SessionRepositoryError};

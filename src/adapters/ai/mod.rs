//! AI Adapters.
//!
//! Providers implement the AIProvider port; the `llm_*` adapters build the
//! interview's inference ports on top of any provider.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for tests and offline runs
//! - `OpenAICompatibleProvider` - Mistral or OpenAI chat completions
//! - `LlmQuestionGenerator` - Phrases questions
//! - `LlmRoleClassifier` - Scores roles from discovery answers
//! - `LlmFieldExtractor` - Maps answers onto open schema fields
//! - `LlmDocumentGenerator` - Writes process documentation from a transcript

pub mod json_payload;
mod llm_document_generator;
mod llm_field_extractor;
mod llm_question_generator;
mod llm_role_classifier;
mod mock_provider;
mod openai_provider;

pub use llm_document_generator::LlmDocumentGenerator;
pub use llm_field_extractor::LlmFieldExtractor;
pub use llm_question_generator::LlmQuestionGenerator;
pub use llm_role_classifier::LlmRoleClassifier;
pub use mock_provider::{MockAIProvider, MockResponse};
pub use openai_provider::{
    OpenAICompatibleConfig, OpenAICompatibleProvider, ProviderPreset, MISTRAL_BASE_URL,
    MISTRAL_DEFAULT_MODEL, OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL,
};

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Chat model providers and the inference adapters built on them
//! - `retrieval` - Background knowledge for question wording
//! - `schema` - Built-in and file-based role schemas
//! - `storage` - Session persistence (in-memory, JSON files)

pub mod ai;
pub mod retrieval;
pub mod schema;
pub mod storage;

pub use ai::{
    LlmDocumentGenerator, LlmFieldExtractor, LlmQuestionGenerator, LlmRoleClassifier, MockAIProvider,
    OpenAICompatibleConfig, OpenAICompatibleProvider, ProviderPreset,
};
pub use retrieval::{KeywordContextRetriever, Snippet};
pub use schema::{builtin_schemas, FileSchemaLoader};
pub use storage::{FileSessionRepository, InMemorySessionRepository};

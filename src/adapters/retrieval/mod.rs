//! Context retrieval adapters.

mod keyword_retriever;

pub use keyword_retriever::{KeywordContextRetriever, Snippet};

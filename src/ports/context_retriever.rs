//! Context Retriever Port - optional background text for question wording.

use async_trait::async_trait;

use crate::domain::interview::Role;

#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Best matching snippet for `query`, or `None` when nothing relevant
    /// is known. Lookup problems are the adapter's to log; callers only
    /// see an absent snippet.
    async fn lookup(&self, role: Option<Role>, query: &str) -> Option<String>;
}

//! Document Generator Port - writes process documentation from a transcript.
//!
//! Implementations may restructure and summarize the answers, but must not
//! add facts the interviewee did not state. Callers fall back to a plain
//! transcript rendering when generation fails.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::interview::{AnsweredQuestion, Role};
use crate::ports::AIError;

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Returns the documentation as markdown.
    async fn generate_document(&self, request: &DocumentRequest) -> Result<String, DocumentError>;
}

/// Everything a generator gets to see of an interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub session_id: SessionId,
    pub role: Option<Role>,
    /// Display name from the role's schema.
    pub role_name: Option<String>,
    /// Answered questions in asking order.
    pub transcript: Vec<AnsweredQuestion>,
}

impl DocumentRequest {
    pub fn new(session_id: SessionId, transcript: Vec<AnsweredQuestion>) -> Self {
        Self {
            session_id,
            role: None,
            role_name: None,
            transcript,
        }
    }

    pub fn with_role(mut self, role: Role, role_name: impl Into<String>) -> Self {
        self.role = Some(role);
        self.role_name = Some(role_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("document generator unavailable: {0}")]
    Unavailable(String),

    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("generator returned no usable document")]
    EmptyResponse,
}

impl DocumentError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_optional_until_set() {
        let request = DocumentRequest::new(SessionId::new(), Vec::new());
        assert_eq!(request.role, None);

        let request = request.with_role(Role::Business, "Fachbereich");
        assert_eq!(request.role, Some(Role::Business));
        assert_eq!(request.role_name.as_deref(), Some("Fachbereich"));
    }

    #[test]
    fn generator_is_object_safe() {
        fn _accepts_dyn(_generator: &dyn DocumentGenerator) {}
    }
}

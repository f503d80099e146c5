//! Role Inference Port - raw role scores from free-text answers.
//!
//! Implementations return whatever the backend produced. Cleaning the
//! scores and deciding what to do with them happens in
//! [`crate::domain::interview::RoleClassifier`].

use async_trait::async_trait;

use crate::domain::interview::{AnsweredQuestion, RawClassification};
use crate::ports::AIError;

#[async_trait]
pub trait RoleInference: Send + Sync {
    /// Scores the answered discovery questions.
    async fn infer(&self, answers: &[AnsweredQuestion]) -> Result<RawClassification, ClassificationError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassificationError {
    #[error("role classifier unavailable: {0}")]
    Unavailable(String),

    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// Backend answered but the payload could not be read.
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}

impl ClassificationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

//! Question Generator Port - turns a structured request into question text.
//!
//! The engine decides *what* to ask (question id, type, options, field
//! link). Generators only supply the wording, so a failing or absent
//! generator never changes which question comes next.

use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::pin::Pin;

use crate::domain::foundation::SessionId;
use crate::domain::interview::{AnsweredQuestion, IntakeTopic, QuestionType, Role};
use crate::ports::AIError;

/// Stream of question text chunks. The last item is always
/// [`QuestionChunk::Final`].
pub type QuestionStream = Pin<Box<dyn Stream<Item = Result<QuestionChunk, GenerationError>> + Send>>;

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generates the full question text.
    async fn generate_question(&self, request: &QuestionRequest) -> Result<String, GenerationError>;

    /// Streams the question text as it is produced.
    ///
    /// The default implementation yields the complete text as a single
    /// final chunk.
    async fn generate_question_stream(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionStream, GenerationError> {
        let text = self.generate_question(request).await?;
        Ok(Box::pin(stream::once(async move {
            Ok::<_, GenerationError>(QuestionChunk::Final(text))
        })))
    }
}

/// One piece of a streamed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionChunk {
    /// Partial text for display.
    Delta(String),
    /// The complete question text.
    Final(String),
}

/// What the question should ask about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionTarget {
    /// One slot of the fixed intake schedule.
    Intake { topic: IntakeTopic, number: usize },
    /// One schema field of the assigned role.
    Field {
        role: Role,
        theme_name: String,
        field_id: String,
        canonical_question: String,
        question_type: QuestionType,
        options: Vec<String>,
        hint: Option<String>,
    },
}

impl QuestionTarget {
    /// Text used when generation is unavailable.
    pub fn fallback_text(&self) -> String {
        match self {
            Self::Intake { topic, .. } => topic.canned_text().to_string(),
            Self::Field {
                canonical_question, ..
            } => canonical_question.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub session_id: SessionId,
    pub target: QuestionTarget,
    /// Most recent answers, oldest first.
    pub history: Vec<AnsweredQuestion>,
    /// Optional background snippet from the context retriever.
    pub context: Option<String>,
}

impl QuestionRequest {
    pub fn new(session_id: SessionId, target: QuestionTarget) -> Self {
        Self {
            session_id,
            target,
            history: Vec::new(),
            context: None,
        }
    }

    pub fn with_history(mut self, history: Vec<AnsweredQuestion>) -> Self {
        self.history = history;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("question generator unavailable: {0}")]
    Unavailable(String),

    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("generator returned no usable text")]
    EmptyResponse,

    #[error("stream ended without a final chunk")]
    IncompleteStream,
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct Fixed;

    #[async_trait]
    impl QuestionGenerator for Fixed {
        async fn generate_question(&self, _request: &QuestionRequest) -> Result<String, GenerationError> {
            Ok("Welche Systeme nutzen Sie?".to_string())
        }
    }

    fn intake_request() -> QuestionRequest {
        QuestionRequest::new(
            SessionId::new(),
            QuestionTarget::Intake {
                topic: IntakeTopic::RoleFunction,
                number: 1,
            },
        )
    }

    #[tokio::test]
    async fn default_stream_yields_single_final_chunk() {
        let chunks: Vec<_> = Fixed
            .generate_question_stream(&intake_request())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(
            chunks,
            vec![Ok(QuestionChunk::Final("Welche Systeme nutzen Sie?".to_string()))]
        );
    }

    #[test]
    fn fallback_text_follows_target() {
        assert_eq!(
            intake_request().target.fallback_text(),
            IntakeTopic::RoleFunction.canned_text()
        );
        let field = QuestionTarget::Field {
            role: Role::It,
            theme_name: "Systeme".to_string(),
            field_id: "involved_systems".to_string(),
            canonical_question: "Welche Systeme sind beteiligt?".to_string(),
            question_type: QuestionType::Text,
            options: vec![],
            hint: None,
        };
        assert_eq!(field.fallback_text(), "Welche Systeme sind beteiligt?");
    }

    #[test]
    fn generator_is_object_safe() {
        fn _accepts_dyn(_generator: &dyn QuestionGenerator) {}
    }
}

//! StartInterviewHandler - Command handler for opening an interview.

use std::sync::Arc;

use super::{select_next, DeltaSink, InterviewHandlerError};
use crate::domain::foundation::SessionId;
use crate::domain::interview::{InterviewEngine, InterviewSession, Question};
use crate::ports::SessionRepository;

/// Command to start a new interview.
#[derive(Debug, Clone, Default)]
pub struct StartInterviewCommand {
    /// Use this id instead of a generated one.
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone)]
pub struct StartInterviewResult {
    pub session_id: SessionId,
    pub question: Option<Question>,
}

pub struct StartInterviewHandler {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
}

impl StartInterviewHandler {
    pub fn new(engine: Arc<InterviewEngine>, repository: Arc<dyn SessionRepository>) -> Self {
        Self { engine, repository }
    }

    pub async fn handle(
        &self,
        cmd: StartInterviewCommand,
    ) -> Result<StartInterviewResult, InterviewHandlerError> {
        self.run(cmd, None).await
    }

    /// Like [`Self::handle`], streaming the first question's wording.
    pub async fn handle_streaming(
        &self,
        cmd: StartInterviewCommand,
        on_delta: DeltaSink<'_>,
    ) -> Result<StartInterviewResult, InterviewHandlerError> {
        self.run(cmd, Some(on_delta)).await
    }

    async fn run(
        &self,
        cmd: StartInterviewCommand,
        on_delta: Option<DeltaSink<'_>>,
    ) -> Result<StartInterviewResult, InterviewHandlerError> {
        let mut session = match cmd.session_id {
            Some(id) => InterviewSession::with_id(id),
            None => InterviewSession::new(),
        };

        let question = select_next(&self.engine, &mut session, on_delta).await?;
        self.repository.save(&session).await?;

        tracing::info!(session_id = %session.id(), "interview started");
        Ok(StartInterviewResult {
            session_id: session.id(),
            question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::interview::schema::SchemaStore;
    use crate::domain::interview::InterviewPhase;

    fn handler() -> (StartInterviewHandler, Arc<InMemorySessionRepository>) {
        let repository = Arc::new(InMemorySessionRepository::new());
        let engine = Arc::new(InterviewEngine::new(Arc::new(SchemaStore::new())));
        (StartInterviewHandler::new(engine, repository.clone()), repository)
    }

    #[tokio::test]
    async fn creates_and_persists_session_with_first_question() {
        let (handler, repository) = handler();

        let result = handler.handle(StartInterviewCommand::default()).await.unwrap();

        let question = result.question.unwrap();
        assert_eq!(question.id, "role_function");
        let stored = repository.load(result.session_id).await.unwrap().unwrap();
        assert_eq!(stored.phase(), InterviewPhase::Intake);
        assert_eq!(stored.intake_questions().len(), 1);
    }

    #[tokio::test]
    async fn honours_requested_session_id() {
        let (handler, repository) = handler();
        let id = SessionId::new();

        let result = handler
            .handle(StartInterviewCommand { session_id: Some(id) })
            .await
            .unwrap();

        assert_eq!(result.session_id, id);
        assert!(repository.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn streaming_without_generator_still_returns_question() {
        let (handler, _) = handler();
        let mut streamed = String::new();
        let mut sink = |delta: &str| streamed.push_str(delta);

        let result = handler
            .handle_streaming(StartInterviewCommand::default(), &mut sink)
            .await
            .unwrap();

        assert!(result.question.is_some());
    }
}

//! ResumeInterviewHandler - Command handler for continuing a stored interview.
//!
//! Returns the pending question unchanged when there is one; otherwise the
//! engine selects the next question, exactly as after the last answer.

use std::sync::Arc;

use super::{select_next, DeltaSink, InterviewHandlerError, SessionLocks};
use crate::domain::foundation::SessionId;
use crate::domain::interview::{InterviewEngine, InterviewPhase, Question};
use crate::ports::SessionRepository;

#[derive(Debug, Clone, Copy)]
pub struct ResumeInterviewCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone)]
pub struct ResumeInterviewResult {
    pub session_id: SessionId,
    pub phase: InterviewPhase,
    /// Answers recorded before this turn.
    pub answered: usize,
    /// `None` once the interview is complete.
    pub question: Option<Question>,
}

pub struct ResumeInterviewHandler {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl ResumeInterviewHandler {
    pub fn new(
        engine: Arc<InterviewEngine>,
        repository: Arc<dyn SessionRepository>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            engine,
            repository,
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: ResumeInterviewCommand,
    ) -> Result<ResumeInterviewResult, InterviewHandlerError> {
        self.run(cmd, None).await
    }

    /// Like [`Self::handle`], streaming the wording of a newly selected question.
    pub async fn handle_streaming(
        &self,
        cmd: ResumeInterviewCommand,
        on_delta: DeltaSink<'_>,
    ) -> Result<ResumeInterviewResult, InterviewHandlerError> {
        self.run(cmd, Some(on_delta)).await
    }

    async fn run(
        &self,
        cmd: ResumeInterviewCommand,
        on_delta: Option<DeltaSink<'_>>,
    ) -> Result<ResumeInterviewResult, InterviewHandlerError> {
        let _turn = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .repository
            .load(cmd.session_id)
            .await?
            .ok_or(InterviewHandlerError::SessionNotFound(cmd.session_id))?;

        let question = select_next(&self.engine, &mut session, on_delta).await?;
        self.repository.save(&session).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            phase = %session.phase(),
            question_id = question.as_ref().map(|q| q.id.as_str()),
            "interview resumed"
        );
        Ok(ResumeInterviewResult {
            session_id: cmd.session_id,
            phase: session.phase(),
            answered: session.answers().len(),
            question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::schema::builtin_schemas;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::interview::{EngineConfig, InterviewSession, INTAKE_QUESTION_COUNT};

    struct Fixture {
        handler: ResumeInterviewHandler,
        engine: Arc<InterviewEngine>,
        repository: Arc<InMemorySessionRepository>,
    }

    fn fixture(config: EngineConfig) -> Fixture {
        let engine = Arc::new(InterviewEngine::new(Arc::new(builtin_schemas().unwrap())).with_config(config));
        let repository = Arc::new(InMemorySessionRepository::new());
        let handler = ResumeInterviewHandler::new(
            engine.clone(),
            repository.clone(),
            Arc::new(SessionLocks::new()),
        );
        Fixture {
            handler,
            engine,
            repository,
        }
    }

    fn resume(session_id: SessionId) -> ResumeInterviewCommand {
        ResumeInterviewCommand { session_id }
    }

    #[tokio::test]
    async fn pending_question_is_returned_again() {
        let fixture = fixture(EngineConfig::default());
        let mut session = InterviewSession::new();
        let pending = fixture.engine.next_question(&mut session).await.unwrap().unwrap();
        fixture.repository.save(&session).await.unwrap();

        let result = fixture.handler.handle(resume(session.id())).await.unwrap();

        assert_eq!(result.question, Some(pending));
        assert_eq!(result.phase, InterviewPhase::Intake);
        let stored = fixture.repository.load(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.intake_questions().len(), 1);
    }

    #[tokio::test]
    async fn session_saved_after_an_answer_gets_its_next_question() {
        let fixture = fixture(EngineConfig::default());
        let mut session = InterviewSession::new();
        let first = fixture.engine.next_question(&mut session).await.unwrap().unwrap();
        fixture
            .engine
            .process_text_answer(&mut session, &first.id, "Controlling")
            .await
            .unwrap();
        fixture.repository.save(&session).await.unwrap();

        let result = fixture.handler.handle(resume(session.id())).await.unwrap();

        assert_eq!(result.answered, 1);
        assert_eq!(result.question.unwrap().id, "tasks_responsibility");
        let stored = fixture.repository.load(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.intake_questions().len(), 2);
    }

    #[tokio::test]
    async fn completed_session_has_no_question() {
        let fixture = fixture(EngineConfig {
            stop_after_classification: true,
            ..EngineConfig::default()
        });
        let mut session = InterviewSession::new();
        for _ in 0..INTAKE_QUESTION_COUNT {
            let question = fixture.engine.next_question(&mut session).await.unwrap().unwrap();
            fixture
                .engine
                .process_text_answer(&mut session, &question.id, "Nein")
                .await
                .unwrap();
        }
        while let Some(question) = fixture.engine.next_question(&mut session).await.unwrap() {
            fixture
                .engine
                .process_text_answer(&mut session, &question.id, "1")
                .await
                .unwrap();
        }
        fixture.repository.save(&session).await.unwrap();

        let result = fixture.handler.handle(resume(session.id())).await.unwrap();

        assert_eq!(result.phase, InterviewPhase::Complete);
        assert_eq!(result.question, None);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let fixture = fixture(EngineConfig::default());
        let err = fixture.handler.handle(resume(SessionId::new())).await.unwrap_err();
        assert!(matches!(err, InterviewHandlerError::SessionNotFound(_)));
    }
}

//! SubmitAnswerHandler - Command handler for one interview turn.

use serde::Serialize;
use std::sync::Arc;

use super::{select_next, DeltaSink, InterviewHandlerError, SessionLocks};
use crate::domain::foundation::SessionId;
use crate::domain::interview::{InterviewEngine, ProgressReport, Question, Role};
use crate::ports::SessionRepository;

/// Command to answer the session's current question.
#[derive(Debug, Clone)]
pub struct SubmitAnswerCommand {
    pub session_id: SessionId,
    pub question_id: String,
    /// Answer as typed; interpreted against the question's type.
    pub answer: String,
}

/// What an interview ended with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionSummary {
    pub role: Option<Role>,
    pub role_low_confidence: bool,
    pub answered: usize,
    pub progress: Option<ProgressReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    Question(Question),
    Complete(CompletionSummary),
}

#[derive(Debug, Clone)]
pub struct SubmitAnswerResult {
    pub session_id: SessionId,
    /// Fields filled from the answer beyond the question's own field.
    pub backfilled: Vec<String>,
    pub next: NextStep,
}

pub struct SubmitAnswerHandler {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl SubmitAnswerHandler {
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
        cmd: SubmitAnswerCommand,
    ) -> Result<SubmitAnswerResult, InterviewHandlerError> {
        self.run(cmd, None).await
    }

    /// Like [`Self::handle`], streaming the next question's wording.
    pub async fn handle_streaming(
        &self,
        cmd: SubmitAnswerCommand,
        on_delta: DeltaSink<'_>,
    ) -> Result<SubmitAnswerResult, InterviewHandlerError> {
        self.run(cmd, Some(on_delta)).await
    }

    async fn run(
        &self,
        cmd: SubmitAnswerCommand,
        on_delta: Option<DeltaSink<'_>>,
    ) -> Result<SubmitAnswerResult, InterviewHandlerError> {
        let _turn = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .repository
            .load(cmd.session_id)
            .await?
            .ok_or(InterviewHandlerError::SessionNotFound(cmd.session_id))?;
        if session.is_complete() {
            return Err(InterviewHandlerError::AlreadyComplete(cmd.session_id));
        }

        let outcome = self
            .engine
            .process_text_answer(&mut session, &cmd.question_id, &cmd.answer)
            .await?;
        let question = select_next(&self.engine, &mut session, on_delta).await?;
        self.repository.save(&session).await?;

        let next = match question {
            Some(question) => NextStep::Question(question),
            None => {
                let status = self.engine.status(&session)?;
                tracing::info!(
                    session_id = %session.id(),
                    role = ?status.role,
                    answered = status.answered,
                    "interview complete"
                );
                NextStep::Complete(CompletionSummary {
                    role: status.role,
                    role_low_confidence: status.role_low_confidence,
                    answered: status.answered,
                    progress: status.progress,
                })
            }
        };

        Ok(SubmitAnswerResult {
            session_id: cmd.session_id,
            backfilled: outcome.backfilled,
            next,
        })
    }
}

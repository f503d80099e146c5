//! Interview command and query handlers.
//!
//! Callers hold only a session id; handlers load the session, run one engine
//! step and persist the result.

mod abandon_interview;
mod errors;
mod generate_document;
mod get_interview_status;
mod resume_interview;
mod session_locks;
mod start_interview;
mod submit_answer;

pub use abandon_interview::{AbandonInterviewCommand, AbandonInterviewHandler};
pub use errors::InterviewHandlerError;
pub use generate_document::{GenerateDocumentHandler, GenerateDocumentQuery};
pub use get_interview_status::{GetInterviewStatusHandler, GetInterviewStatusQuery};
pub use resume_interview::{ResumeInterviewCommand, ResumeInterviewHandler, ResumeInterviewResult};
pub use session_locks::SessionLocks;
pub use start_interview::{StartInterviewCommand, StartInterviewHandler, StartInterviewResult};
pub use submit_answer::{
    CompletionSummary, NextStep, SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult,
};

use crate::domain::interview::{EngineError, InterviewEngine, InterviewSession, Question};

/// Receives partial question text while it is generated.
pub type DeltaSink<'a> = &'a mut (dyn FnMut(&str) + Send);

async fn select_next(
    engine: &InterviewEngine,
    session: &mut InterviewSession,
    on_delta: Option<DeltaSink<'_>>,
) -> Result<Option<Question>, EngineError> {
    match on_delta {
        Some(sink) => engine.next_question_streaming(session, sink).await,
        None => engine.next_question(session).await,
    }
}

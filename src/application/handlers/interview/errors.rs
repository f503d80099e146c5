//! Errors of the interview handlers.

use thiserror::Error;

use crate::domain::foundation::SessionId;
use crate::domain::interview::EngineError;
use crate::ports::SessionRepositoryError;

#[derive(Debug, Error)]
pub enum InterviewHandlerError {
    #[error("interview session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("interview session {0} is already complete")]
    AlreadyComplete(SessionId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("session storage failed: {0}")]
    Repository(#[source] SessionRepositoryError),
}

impl From<SessionRepositoryError> for InterviewHandlerError {
    fn from(err: SessionRepositoryError) -> Self {
        match err {
            SessionRepositoryError::NotFound(id) => Self::SessionNotFound(id),
            other => Self::Repository(other),
        }
    }
}

impl InterviewHandlerError {
    /// True when the caller's input was at fault rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_)
                | Self::AlreadyComplete(_)
                | Self::Engine(EngineError::UnknownQuestion(_))
                | Self::Engine(EngineError::AlreadyAnswered(_))
        )
    }
}

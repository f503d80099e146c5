//! AbandonInterviewHandler - Command handler for discarding an interview.

use std::sync::Arc;

use super::{InterviewHandlerError, SessionLocks};
use crate::domain::foundation::SessionId;
use crate::ports::SessionRepository;

#[derive(Debug, Clone, Copy)]
pub struct AbandonInterviewCommand {
    pub session_id: SessionId,
}

pub struct AbandonInterviewHandler {
    repository: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl AbandonInterviewHandler {
    pub fn new(repository: Arc<dyn SessionRepository>, locks: Arc<SessionLocks>) -> Self {
        Self { repository, locks }
    }

    /// Deletes the session once any running turn has finished.
    pub async fn handle(&self, cmd: AbandonInterviewCommand) -> Result<(), InterviewHandlerError> {
        {
            let _turn = self.locks.acquire(cmd.session_id).await;
            self.repository.delete(cmd.session_id).await?;
        }
        self.locks.forget(cmd.session_id);
        tracing::info!(session_id = %cmd.session_id, "interview abandoned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::interview::InterviewSession;

    #[tokio::test]
    async fn deletes_session() {
        let repository = Arc::new(InMemorySessionRepository::new());
        let locks = Arc::new(SessionLocks::new());
        let session = InterviewSession::new();
        repository.save(&session).await.unwrap();

        AbandonInterviewHandler::new(repository.clone(), locks.clone())
            .handle(AbandonInterviewCommand {
                session_id: session.id(),
            })
            .await
            .unwrap();

        assert!(!repository.exists(session.id()).await.unwrap());
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = AbandonInterviewHandler::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(SessionLocks::new()),
        );
        let err = handler
            .handle(AbandonInterviewCommand {
                session_id: SessionId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewHandlerError::SessionNotFound(_)));
    }
}

//! Session Repository Port - persistence of interview sessions.
//!
//! Sessions are plain data. The repository stores and returns them whole;
//! it never interprets interview state.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::interview::InterviewSession;

#[derive(Debug, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SessionRepositoryError {
    pub fn io(err: impl std::fmt::Display) -> Self {
        Self::Io(err.to_string())
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts or replaces the session.
    async fn save(&self, session: &InterviewSession) -> Result<(), SessionRepositoryError>;

    /// Returns `None` if no session with this id exists.
    async fn load(&self, id: SessionId) -> Result<Option<InterviewSession>, SessionRepositoryError>;

    /// Removes the session.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session doesn't exist
    async fn delete(&self, id: SessionId) -> Result<(), SessionRepositoryError>;

    /// Ids of all stored sessions.
    async fn list(&self) -> Result<Vec<SessionId>, SessionRepositoryError>;

    async fn exists(&self, id: SessionId) -> Result<bool, SessionRepositoryError> {
        Ok(self.load(id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }

    #[test]
    fn not_found_names_the_session() {
        let id = SessionId::new();
        assert_eq!(
            SessionRepositoryError::NotFound(id).to_string(),
            format!("session not found: {}", id)
        );
    }
}

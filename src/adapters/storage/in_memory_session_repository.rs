//! In-Memory Session Repository
//!
//! Keeps sessions in a map. Useful for tests and runs without a session
//! directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::interview::InterviewSession;
use crate::ports::{SessionRepository, SessionRepositoryError};

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, InterviewSession>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &InterviewSession) -> Result<(), SessionRepositoryError> {
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        Ok(())
    }

    async fn load(&self, id: SessionId) -> Result<Option<InterviewSession>, SessionRepositoryError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionRepositoryError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionRepositoryError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionRepositoryError> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn exists(&self, id: SessionId) -> Result<bool, SessionRepositoryError> {
        Ok(self.sessions.read().await.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interview::FieldValue;

    #[tokio::test]
    async fn save_and_load() {
        let repository = InMemorySessionRepository::new();
        let mut session = InterviewSession::new();
        session.record_answer("role_function", FieldValue::scalar("Administrator"));

        repository.save(&session).await.unwrap();
        let loaded = repository.load(session.id()).await.unwrap();

        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let repository = InMemorySessionRepository::new();
        assert_eq!(repository.load(SessionId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_previous_version() {
        let repository = InMemorySessionRepository::new();
        let mut session = InterviewSession::new();
        repository.save(&session).await.unwrap();

        session.record_answer("role_function", FieldValue::scalar("Teamleitung"));
        repository.save(&session).await.unwrap();

        assert_eq!(repository.session_count().await, 1);
        let loaded = repository.load(session.id()).await.unwrap().unwrap();
        assert!(loaded.is_answered("role_function"));
    }

    #[tokio::test]
    async fn delete_removes_and_reports_missing() {
        let repository = InMemorySessionRepository::new();
        let session = InterviewSession::new();
        repository.save(&session).await.unwrap();

        repository.delete(session.id()).await.unwrap();
        assert!(!repository.exists(session.id()).await.unwrap());

        let err = repository.delete(session.id()).await.unwrap_err();
        assert!(matches!(err, SessionRepositoryError::NotFound(id) if id == session.id()));
    }

    #[tokio::test]
    async fn list_returns_all_ids() {
        let repository = InMemorySessionRepository::new();
        let first = InterviewSession::new();
        let second = InterviewSession::new();
        repository.save(&first).await.unwrap();
        repository.save(&second).await.unwrap();

        let ids = repository.list().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id()));
        assert!(ids.contains(&second.id()));

        repository.clear().await;
        assert!(repository.list().await.unwrap().is_empty());
    }
}

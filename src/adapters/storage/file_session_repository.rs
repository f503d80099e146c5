//! File-based Session Repository
//!
//! Stores each session as `<session_id>.json` in a base directory. Every file
//! carries a `_meta` block next to the session data:
//!
//! ```json
//! {
//!   "_meta": { "session_id": "...", "saved_at": "...", "format_version": 1 },
//!   "id": "...",
//!   "phase": "intake",
//!   ...
//! }
//! ```
//!
//! Files without `_meta` still load.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::interview::InterviewSession;
use crate::ports::{SessionRepository, SessionRepositoryError};

/// Version written into `_meta.format_version`.
pub const FORMAT_VERSION: u32 = 1;

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    session_id: String,
    saved_at: Timestamp,
    format_version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    meta: Option<StoredMeta>,
    #[serde(flatten)]
    session: InterviewSession,
}

#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    base_path: PathBuf,
}

impl FileSessionRepository {
    /// Create a repository rooted at `base_path`. The directory is created on
    /// first save.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn session_file_path(&self, id: SessionId) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", sanitize_id(&id.to_string()), EXTENSION))
    }

    async fn ensure_dir(&self) -> Result<(), SessionRepositoryError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(SessionRepositoryError::io)
    }
}

/// Keeps only characters that are safe in a file name.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn save(&self, session: &InterviewSession) -> Result<(), SessionRepositoryError> {
        self.ensure_dir().await?;

        let stored = StoredSession {
            meta: Some(StoredMeta {
                session_id: session.id().to_string(),
                saved_at: Timestamp::now(),
                format_version: FORMAT_VERSION,
            }),
            session: session.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| SessionRepositoryError::SerializationFailed(e.to_string()))?;

        // Write then rename so a crash never leaves a half-written session.
        let path = self.session_file_path(session.id());
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(SessionRepositoryError::io)?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(SessionRepositoryError::io)?;

        tracing::debug!(session_id = %session.id(), path = %path.display(), "session saved");
        Ok(())
    }

    async fn load(&self, id: SessionId) -> Result<Option<InterviewSession>, SessionRepositoryError> {
        let path = self.session_file_path(id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionRepositoryError::io(e)),
        };

        let stored: StoredSession = serde_json::from_str(&json)
            .map_err(|e| SessionRepositoryError::DeserializationFailed(e.to_string()))?;
        if let Some(meta) = &stored.meta {
            if meta.format_version > FORMAT_VERSION {
                tracing::warn!(
                    session_id = %id,
                    format_version = meta.format_version,
                    "session written by a newer format version"
                );
            }
        }
        Ok(Some(stored.session))
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionRepositoryError> {
        match fs::remove_file(self.session_file_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SessionRepositoryError::NotFound(id)),
            Err(e) => Err(SessionRepositoryError::io(e)),
        }
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionRepositoryError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SessionRepositoryError::io(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(SessionRepositoryError::io)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Foreign files in the directory are ignored.
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<SessionId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn exists(&self, id: SessionId) -> Result<bool, SessionRepositoryError> {
        fs::try_exists(self.session_file_path(id))
            .await
            .map_err(SessionRepositoryError::io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interview::{FieldValue, InterviewPhase};
    use tempfile::TempDir;

    fn answered_session() -> InterviewSession {
        let mut session = InterviewSession::new();
        session.record_answer("role_function", FieldValue::scalar("SAP Basis Administrator"));
        session.record_answer("project_leadership", FieldValue::scalar("Nein"));
        session
    }

    mod persistence {
        use super::*;

        #[tokio::test]
        async fn save_and_load_round_trip() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let session = answered_session();

            repository.save(&session).await.unwrap();
            let loaded = repository.load(session.id()).await.unwrap().unwrap();

            assert_eq!(loaded, session);
        }

        #[tokio::test]
        async fn load_missing_is_none() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            assert!(repository.load(SessionId::new()).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn creates_nested_base_directory() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path().join("data").join("sessions"));
            let session = InterviewSession::new();

            repository.save(&session).await.unwrap();

            assert!(repository.session_file_path(session.id()).exists());
        }

        #[tokio::test]
        async fn file_carries_meta_block() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let session = answered_session();
            repository.save(&session).await.unwrap();

            let raw = std::fs::read_to_string(repository.session_file_path(session.id())).unwrap();
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

            assert_eq!(value["_meta"]["session_id"], session.id().to_string());
            assert_eq!(value["_meta"]["format_version"], FORMAT_VERSION);
            assert_eq!(value["answers"]["role_function"], "SAP Basis Administrator");
        }

        #[tokio::test]
        async fn loads_file_without_meta() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let id = SessionId::new();
            let raw = format!(
                r#"{{"id":"{}","phase":"intake","created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-01T10:00:00Z"}}"#,
                id
            );
            std::fs::write(repository.session_file_path(id), raw).unwrap();

            let loaded = repository.load(id).await.unwrap().unwrap();
            assert_eq!(loaded.id(), id);
            assert_eq!(loaded.phase(), InterviewPhase::Intake);
        }

        #[tokio::test]
        async fn corrupt_file_is_deserialization_error() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let id = SessionId::new();
            std::fs::write(repository.session_file_path(id), "{ not json").unwrap();

            let err = repository.load(id).await.unwrap_err();
            assert!(matches!(err, SessionRepositoryError::DeserializationFailed(_)));
        }
    }

    mod management {
        use super::*;

        #[tokio::test]
        async fn delete_and_exists() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let session = InterviewSession::new();

            assert!(!repository.exists(session.id()).await.unwrap());
            repository.save(&session).await.unwrap();
            assert!(repository.exists(session.id()).await.unwrap());

            repository.delete(session.id()).await.unwrap();
            assert!(!repository.exists(session.id()).await.unwrap());
            assert!(matches!(
                repository.delete(session.id()).await,
                Err(SessionRepositoryError::NotFound(_))
            ));
        }

        #[tokio::test]
        async fn list_skips_foreign_files() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path());
            let first = InterviewSession::new();
            let second = InterviewSession::new();
            repository.save(&first).await.unwrap();
            repository.save(&second).await.unwrap();
            std::fs::write(temp_dir.path().join("notes.json"), "{}").unwrap();
            std::fs::write(temp_dir.path().join("README.txt"), "hi").unwrap();

            let mut expected = vec![first.id(), second.id()];
            expected.sort();
            assert_eq!(repository.list().await.unwrap(), expected);
        }

        #[tokio::test]
        async fn list_of_missing_directory_is_empty() {
            let temp_dir = TempDir::new().unwrap();
            let repository = FileSessionRepository::new(temp_dir.path().join("nowhere"));
            assert!(repository.list().await.unwrap().is_empty());
        }
    }

    #[test]
    fn sanitize_drops_path_characters() {
        assert_eq!(sanitize_id("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_id("abc-123_x"), "abc-123_x");
    }
}

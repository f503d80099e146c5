//! GenerateDocumentHandler - Query handler producing process documentation.

use std::sync::Arc;

use super::InterviewHandlerError;
use crate::domain::foundation::SessionId;
use crate::domain::interview::{InterviewEngine, ProcessDocument};
use crate::ports::SessionRepository;

#[derive(Debug, Clone, Copy)]
pub struct GenerateDocumentQuery {
    pub session_id: SessionId,
}

pub struct GenerateDocumentHandler {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
}

impl GenerateDocumentHandler {
    pub fn new(engine: Arc<InterviewEngine>, repository: Arc<dyn SessionRepository>) -> Self {
        Self { engine, repository }
    }

    pub async fn handle(
        &self,
        query: GenerateDocumentQuery,
    ) -> Result<ProcessDocument, InterviewHandlerError> {
        let session = self
            .repository
            .load(query.session_id)
            .await?
            .ok_or(InterviewHandlerError::SessionNotFound(query.session_id))?;

        let document = self.engine.document(&session).await?;
        tracing::info!(
            session_id = %query.session_id,
            source = ?document.source,
            "process document generated"
        );
        Ok(document)
    }
}

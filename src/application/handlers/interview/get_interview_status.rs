//! GetInterviewStatusHandler - Query handler for an interview snapshot.

use std::sync::Arc;

use super::InterviewHandlerError;
use crate::domain::foundation::SessionId;
use crate::domain::interview::{InterviewEngine, InterviewStatus};
use crate::ports::SessionRepository;

#[derive(Debug, Clone, Copy)]
pub struct GetInterviewStatusQuery {
    pub session_id: SessionId,
}

pub struct GetInterviewStatusHandler {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
}

impl GetInterviewStatusHandler {
    pub fn new(engine: Arc<InterviewEngine>, repository: Arc<dyn SessionRepository>) -> Self {
        Self { engine, repository }
    }

    pub async fn handle(
        &self,
        query: GetInterviewStatusQuery,
    ) -> Result<InterviewStatus, InterviewHandlerError> {
        let session = self
            .repository
            .load(query.session_id)
            .await?
            .ok_or(InterviewHandlerError::SessionNotFound(query.session_id))?;
        Ok(self.engine.status(&session)?)
    }
}

//! Field Inference Port - best-effort mapping of one answer onto several
//! schema fields.

use async_trait::async_trait;

use crate::domain::interview::{FieldInferenceOutput, FieldInferenceRequest};
use crate::ports::AIError;

#[async_trait]
pub trait FieldInference: Send + Sync {
    async fn infer(&self, request: &FieldInferenceRequest) -> Result<FieldInferenceOutput, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("field extractor unavailable: {0}")]
    Unavailable(String),

    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("invalid extractor response: {0}")]
    InvalidResponse(String),
}

impl ExtractionError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_inference_is_object_safe() {
        fn _accepts_dyn(_inference: &dyn FieldInference) {}
    }

    #[test]
    fn errors_display() {
        assert_eq!(
            ExtractionError::invalid_response("not json").to_string(),
            "invalid extractor response: not json"
        );
    }
}

//! FieldInference backed by a chat model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::json_payload::parse_payload;
use crate::domain::interview::{
    ExtractionConfidence, FieldInferenceOutput, FieldInferenceRequest, FieldValue,
};
use crate::ports::{
    AIProvider, CompletionRequest, ExtractionError, FieldInference, MessageRole, RequestMetadata,
    RequestPurpose,
};

const SYSTEM_PROMPT: &str = "You map one interview answer onto structured fields. Only fill a \
field when the answer states the information explicitly; never guess. For choice fields use \
one of the listed options verbatim. Respond with a single JSON object:\n\
{\"fields\": {\"<field_id>\": <string or list of strings>}, \"confidence\": \"high|medium|low\"}\n\
Use an empty \"fields\" object when nothing applies.";

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    fields: BTreeMap<String, Value>,
    #[serde(default)]
    confidence: Option<String>,
}

pub struct LlmFieldExtractor {
    ai_provider: Arc<dyn AIProvider>,
}

impl LlmFieldExtractor {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self { ai_provider }
    }

    fn build_prompt(request: &FieldInferenceRequest) -> Result<String, ExtractionError> {
        let open_fields = serde_json::to_string_pretty(&request.open_fields)
            .map_err(|e| ExtractionError::invalid_response(e.to_string()))?;
        Ok(format!(
            "Role: {}\nThe answer was given to the question for field '{}'.\n\
             Answer:\n{}\n\nOpen fields:\n{}",
            request.role.as_str(),
            request.primary_field_id,
            request.answer_text,
            open_fields
        ))
    }

    fn parse_response(content: &str) -> Result<FieldInferenceOutput, ExtractionError> {
        let payload: ExtractionPayload =
            parse_payload(content).map_err(ExtractionError::invalid_response)?;

        let confidence = match payload.confidence.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("high") => ExtractionConfidence::High,
            Some("medium") => ExtractionConfidence::Medium,
            _ => ExtractionConfidence::Low,
        };
        let fields = payload
            .fields
            .iter()
            .filter_map(|(id, value)| FieldValue::from_json(value).map(|v| (id.clone(), v)))
            .collect();
        Ok(FieldInferenceOutput { fields, confidence })
    }
}

#[async_trait]
impl FieldInference for LlmFieldExtractor {
    async fn infer(&self, request: &FieldInferenceRequest) -> Result<FieldInferenceOutput, ExtractionError> {
        let completion = CompletionRequest::new(RequestMetadata::new(RequestPurpose::FieldExtraction))
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, Self::build_prompt(request)?)
            .with_temperature(0.0)
            .with_max_tokens(500)
            .with_json_response();

        let response = self.ai_provider.complete(completion).await?;
        Self::parse_response(&response.content)
    }
}

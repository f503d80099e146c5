//! Best-effort mapping of one answer onto several schema fields.
//!
//! The primary field always receives the answer. Other fields are only
//! added when the inference backend reports at least medium confidence,
//! and only if they are known, still open and non-empty. Any failure
//! degrades to the primary mapping alone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::schema::RoleSchema;
use super::{FieldValue, FilledFields, QuestionType, Role};
use crate::ports::FieldInference;

/// Confidence reported by an extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionConfidence {
    High,
    Medium,
    Low,
}

impl ExtractionConfidence {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

/// A still-unfilled field offered to the extraction backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenField {
    pub field_id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub field_type: QuestionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Input of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInferenceRequest {
    pub role: Role,
    pub answer_text: String,
    pub primary_field_id: String,
    pub open_fields: Vec<OpenField>,
}

/// Output of one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInferenceOutput {
    pub fields: BTreeMap<String, FieldValue>,
    pub confidence: ExtractionConfidence,
}

/// Applies the extraction policy around an optional backend.
#[derive(Clone, Default)]
pub struct FieldExtractor {
    inference: Option<Arc<dyn FieldInference>>,
}

impl FieldExtractor {
    pub fn new(inference: Arc<dyn FieldInference>) -> Self {
        Self {
            inference: Some(inference),
        }
    }

    /// Extractor that only ever maps the primary field.
    pub fn disabled() -> Self {
        Self { inference: None }
    }

    pub async fn extract(
        &self,
        schema: &RoleSchema,
        answer: &FieldValue,
        primary_field_id: &str,
        already_filled: &FilledFields,
    ) -> BTreeMap<String, FieldValue> {
        let mut result = BTreeMap::new();
        result.insert(primary_field_id.to_string(), answer.clone());

        let Some(inference) = &self.inference else {
            return result;
        };

        let open_fields: Vec<OpenField> = schema
            .fields()
            .filter(|f| f.field_id() != primary_field_id && !already_filled.is_filled(f.field_id()))
            .map(|f| OpenField {
                field_id: f.field_id().to_string(),
                question: f.definition.question.clone(),
                field_type: f.definition.field_type,
                options: f.definition.options.clone(),
            })
            .collect();
        if open_fields.is_empty() {
            return result;
        }

        let request = FieldInferenceRequest {
            role: schema.role,
            answer_text: answer.raw_text(),
            primary_field_id: primary_field_id.to_string(),
            open_fields,
        };
        let output = match inference.infer(&request).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(error = %err, field_id = primary_field_id, "field extraction failed; keeping primary field only");
                return result;
            }
        };

        if !output.confidence.is_trusted() {
            tracing::debug!(confidence = ?output.confidence, "discarding low-confidence extraction");
            return result;
        }

        for (field_id, value) in output.fields {
            let is_open = request.open_fields.iter().any(|f| f.field_id == field_id);
            if is_open && !value.is_empty() {
                result.insert(field_id, value);
            }
        }
        tracing::debug!(
            primary = primary_field_id,
            extra = result.len() - 1,
            "extracted additional fields from answer"
        );
        result
    }
}

impl std::fmt::Debug for FieldExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldExtractor")
            .field("inference", &self.inference.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interview::schema::fixtures::it_schema;
    use crate::ports::ExtractionError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedInference {
        output: Result<FieldInferenceOutput, ExtractionError>,
        seen: Mutex<Vec<FieldInferenceRequest>>,
    }

    impl ScriptedInference {
        fn returning(fields: &[(&str, &str)], confidence: ExtractionConfidence) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(FieldInferenceOutput {
                    fields: fields
                        .iter()
                        .map(|(k, v)| (k.to_string(), FieldValue::scalar(*v)))
                        .collect(),
                    confidence,
                }),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                output: Err(ExtractionError::unavailable("offline")),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl FieldInference for ScriptedInference {
        async fn infer(&self, request: &FieldInferenceRequest) -> Result<FieldInferenceOutput, ExtractionError> {
            self.seen.lock().unwrap().push(request.clone());
            self.output.clone()
        }
    }

    fn answer() -> FieldValue {
        FieldValue::scalar("We run SAP with a team of 4 and use role-based access")
    }

    #[tokio::test]
    async fn disabled_extractor_maps_primary_only() {
        let out = FieldExtractor::disabled()
            .extract(&it_schema(), &answer(), "involved_systems", &FilledFields::new())
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out["involved_systems"], answer());
    }

    #[tokio::test]
    async fn trusted_extraction_adds_open_fields() {
        let inference = ScriptedInference::returning(
            &[("team_size", "4"), ("access_model", "Roles")],
            ExtractionConfidence::Medium,
        );
        let out = FieldExtractor::new(inference.clone())
            .extract(&it_schema(), &answer(), "involved_systems", &FilledFields::new())
            .await;
        assert_eq!(out.len(), 3);
        assert_eq!(out["team_size"], FieldValue::scalar("4"));

        let seen = inference.seen.lock().unwrap();
        let offered: Vec<_> = seen[0].open_fields.iter().map(|f| f.field_id.as_str()).collect();
        assert!(!offered.contains(&"involved_systems"));
        assert_eq!(seen[0].role, Role::It);
    }

    #[tokio::test]
    async fn low_confidence_is_ignored() {
        let inference = ScriptedInference::returning(&[("team_size", "4")], ExtractionConfidence::Low);
        let out = FieldExtractor::new(inference)
            .extract(&it_schema(), &answer(), "involved_systems", &FilledFields::new())
            .await;
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["involved_systems"]);
    }

    #[tokio::test]
    async fn never_overwrites_filled_or_invents_unknown_fields() {
        let inference = ScriptedInference::returning(
            &[("team_size", "4"), ("made_up", "x"), ("access_model", " "), ("involved_systems", "Oracle")],
            ExtractionConfidence::High,
        );
        let filled: FilledFields = [("team_size", FieldValue::scalar("10"))].into_iter().collect();
        let out = FieldExtractor::new(inference)
            .extract(&it_schema(), &answer(), "involved_systems", &filled)
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out["involved_systems"], answer());
    }

    #[tokio::test]
    async fn backend_failure_keeps_primary_field() {
        let out = FieldExtractor::new(ScriptedInference::failing())
            .extract(&it_schema(), &answer(), "involved_systems", &FilledFields::new())
            .await;
        assert_eq!(out.len(), 1);
    }
}

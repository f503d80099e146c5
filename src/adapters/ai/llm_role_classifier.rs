//! RoleInference backed by a chat model.
//!
//! The model is asked for a JSON object with scored candidates. Scores are
//! passed through untouched; the domain classifier cleans them up.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::json_payload::extract_json_object;
use crate::domain::interview::{
    is_affirmative, AnsweredQuestion, IntakeTopic, RawCandidate, RawClassification, Role,
};
use crate::ports::{
    AIProvider, ClassificationError, CompletionRequest, MessageRole, RequestMetadata,
    RequestPurpose, RoleInference,
};

const SYSTEM_PROMPT: &str = "You classify interview respondents into exactly one of three \
organizational roles:\n\
- it: works on technical systems, infrastructure, integration or software\n\
- business: carries out or owns operational business processes in a department\n\
- management: sets strategy, leads teams or projects, decides on budgets\n\n\
Answer with a single JSON object and nothing else:\n\
{\"candidates\": [{\"role\": \"it|business|management\", \"score\": 0.0-1.0}, ...], \
\"explanation\": \"one sentence\"}\n\
List every role once, highest score first.";

pub struct LlmRoleClassifier {
    ai_provider: Arc<dyn AIProvider>,
}

impl LlmRoleClassifier {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self { ai_provider }
    }

    fn build_prompt(answers: &[AnsweredQuestion]) -> String {
        let mut prompt = String::from("Interview answers:\n");
        for answer in answers {
            prompt.push_str(&format!("Q: {}\nA: {}\n", answer.question_text, answer.answer));
            if let Some(role) = signalled_role(answer) {
                prompt.push_str(&format!("(a yes here suggests the role '{}')\n", role.as_str()));
            }
        }
        prompt
    }

    /// Reads the model output, accepting a few shapes models produce.
    fn parse_response(content: &str) -> Result<RawClassification, ClassificationError> {
        let value = extract_json_object(content)
            .ok_or_else(|| ClassificationError::invalid_response("no JSON object in response"))?;

        if value.get("candidates").is_some() {
            return serde_json::from_value(value)
                .map_err(|e| ClassificationError::invalid_response(e.to_string()));
        }

        let explanation = value
            .get("explanation")
            .or_else(|| value.get("reason"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // {"scores": {"it": 0.7, ...}}
        if let Some(scores) = value.get("scores").and_then(Value::as_object) {
            let candidates = scores
                .iter()
                .filter_map(|(role, score)| {
                    score.as_f64().map(|score| RawCandidate {
                        role: role.clone(),
                        score,
                    })
                })
                .collect();
            return Ok(RawClassification {
                candidates,
                explanation,
            });
        }

        // {"role": "it", "confidence": 0.8}
        if let (Some(role), Some(score)) = (
            value.get("role").and_then(Value::as_str),
            value.get("confidence").and_then(Value::as_f64),
        ) {
            return Ok(RawClassification {
                candidates: vec![RawCandidate {
                    role: role.to_string(),
                    score,
                }],
                explanation,
            });
        }

        Err(ClassificationError::invalid_response("missing candidates"))
    }
}

/// Role hinted at by an affirmative yes/no intake answer.
fn signalled_role(answer: &AnsweredQuestion) -> Option<Role> {
    IntakeTopic::SCHEDULE
        .iter()
        .find(|topic| topic.question_id() == answer.question_id)
        .and_then(|topic| topic.signals_role())
        .filter(|_| is_affirmative(&answer.answer))
}

#[async_trait]
impl RoleInference for LlmRoleClassifier {
    async fn infer(&self, answers: &[AnsweredQuestion]) -> Result<RawClassification, ClassificationError> {
        let request = CompletionRequest::new(RequestMetadata::new(RequestPurpose::RoleClassification))
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, Self::build_prompt(answers))
            .with_temperature(0.0)
            .with_max_tokens(300)
            .with_json_response();

        let response = self.ai_provider.complete(request).await?;
        let raw = Self::parse_response(&response.content)?;
        tracing::debug!(candidates = raw.candidates.len(), "role classifier responded");
        Ok(raw)
    }
}

//! QuestionGenerator backed by a chat model.

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::domain::interview::{AnsweredQuestion, QuestionType};
use crate::ports::{
    AIProvider, CompletionRequest, GenerationError, MessageRole, QuestionChunk, QuestionGenerator,
    QuestionRequest, QuestionStream, QuestionTarget, RequestMetadata, RequestPurpose,
};

const SYSTEM_PROMPT: &str = "Du führst ein strukturiertes Interview zur Erfassung von \
Arbeitsprozessen in einem Unternehmen. Formuliere genau eine kurze, freundliche Frage auf \
Deutsch. Gib nur die Frage aus, ohne Einleitung, Nummerierung oder Antwortoptionen.";

/// Phrases a question for each request.
pub struct LlmQuestionGenerator {
    ai_provider: Arc<dyn AIProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmQuestionGenerator {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self {
            ai_provider,
            temperature: 0.7,
            max_tokens: 200,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn completion_request(&self, request: &QuestionRequest) -> CompletionRequest {
        let metadata =
            RequestMetadata::new(RequestPurpose::QuestionGeneration).with_session(request.session_id);
        CompletionRequest::new(metadata)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, build_prompt(request))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

fn build_prompt(request: &QuestionRequest) -> String {
    let mut prompt = match &request.target {
        QuestionTarget::Intake { topic, number } => {
            let mut text = format!(
                "Einstiegsfrage {} von 9. Thema: {}.\nBeispiel: {}",
                number,
                topic.descriptor(),
                topic.canned_text()
            );
            if topic.question_type() == QuestionType::Choice {
                text.push_str("\nDie Frage muss mit Ja oder Nein beantwortet werden können.");
            }
            text
        }
        QuestionTarget::Field {
            theme_name,
            canonical_question,
            question_type,
            options,
            hint,
            ..
        } => {
            let mut text = format!(
                "Themenbereich: {}\nZu erfragende Information: {}",
                theme_name, canonical_question
            );
            if !options.is_empty() {
                text.push_str(&format!(
                    "\nDie Antwort wird aus diesen Optionen gewählt ({}): {}",
                    type_label(*question_type),
                    options.join(", ")
                ));
            }
            if let Some(hint) = hint {
                text.push_str(&format!("\nHinweis: {}", hint));
            }
            text
        }
    };

    if let Some(context) = &request.context {
        prompt.push_str(&format!("\nHintergrund aus der Wissensbasis:\n{}", context));
    }
    if !request.history.is_empty() {
        prompt.push_str("\nBisheriger Gesprächsverlauf:\n");
        prompt.push_str(&format_history(&request.history));
    }
    prompt
}

fn type_label(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::MultipleChoice => "Mehrfachauswahl",
        QuestionType::Ranking => "Rangfolge",
        QuestionType::Scale => "Skala",
        _ => "Einfachauswahl",
    }
}

fn format_history(history: &[AnsweredQuestion]) -> String {
    history
        .iter()
        .map(|a| format!("F: {}\nA: {}", a.question_text, a.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips quotes and labels models like to add.
fn clean_question(raw: &str) -> Option<String> {
    let text = raw.trim();
    let text = text
        .strip_prefix("Frage:")
        .or_else(|| text.strip_prefix("Question:"))
        .unwrap_or(text)
        .trim()
        .trim_matches(|c| c == '"' || c == '„' || c == '“')
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate_question(&self, request: &QuestionRequest) -> Result<String, GenerationError> {
        let response = self.ai_provider.complete(self.completion_request(request)).await?;
        clean_question(&response.content).ok_or(GenerationError::EmptyResponse)
    }

    async fn generate_question_stream(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionStream, GenerationError> {
        let chunks = self
            .ai_provider
            .stream_complete(self.completion_request(request))
            .await?;

        let stream = chunks
            .scan(String::new(), |text, item| {
                let out = match item {
                    Ok(chunk) => {
                        let mut out = Vec::new();
                        if !chunk.delta.is_empty() {
                            text.push_str(&chunk.delta);
                            out.push(Ok(QuestionChunk::Delta(chunk.delta)));
                        }
                        if chunk.finish_reason.is_some() {
                            out.push(
                                clean_question(text)
                                    .map(QuestionChunk::Final)
                                    .ok_or(GenerationError::EmptyResponse),
                            );
                        }
                        out
                    }
                    Err(err) => vec![Err(GenerationError::from(err))],
                };
                future::ready(Some(out))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }
}

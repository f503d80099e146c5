//! DocumentGenerator backed by a chat model.

use async_trait::async_trait;
use std::sync::Arc;

use crate::ports::{
    AIProvider, CompletionRequest, DocumentError, DocumentGenerator, DocumentRequest, MessageRole,
    RequestMetadata, RequestPurpose,
};

const SYSTEM_PROMPT: &str = "Du erstellst aus Interview-Transkripten strukturierte \
Prozessdokumentationen in Markdown. Verwende ausschließlich Informationen aus dem Transkript \
und ergänze nichts. Fehlt eine Angabe, schreibe \"Nicht spezifiziert\" oder lasse den Punkt \
weg. Gliederung: Prozessziel, Auslöser, Eingangsdaten, Beteiligte Systeme, Ergebnisse und \
Empfänger, Schnittstellen und Architektur, Sicherheit und Zugriffe, Betrieb und Überwachung. \
Höchstens drei Sätze oder Stichpunkte je Abschnitt. Gib nur das Dokument aus.";

/// Writes process documentation for a transcript.
pub struct LlmDocumentGenerator {
    ai_provider: Arc<dyn AIProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmDocumentGenerator {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self {
            ai_provider,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

fn build_prompt(request: &DocumentRequest) -> String {
    let mut prompt = String::from("Erstelle die Prozessdokumentation zu diesem Interview.\n");
    if let Some(role_name) = &request.role_name {
        prompt.push_str(&format!("Rolle der befragten Person: {}\n", role_name));
    }
    prompt.push_str("\nTranskript:\n");
    for entry in &request.transcript {
        prompt.push_str(&format!("F: {}\nA: {}\n", entry.question_text, entry.answer));
    }
    prompt
}

/// Drops a surrounding ```markdown fence if the model added one.
fn strip_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    match inner.split_once('\n') {
        Some((lang, body)) if !lang.contains(' ') => body.trim(),
        _ => inner.trim(),
    }
}

#[async_trait]
impl DocumentGenerator for LlmDocumentGenerator {
    async fn generate_document(&self, request: &DocumentRequest) -> Result<String, DocumentError> {
        let completion = CompletionRequest::new(
            RequestMetadata::new(RequestPurpose::DocumentGeneration).with_session(request.session_id),
        )
        .with_system_prompt(SYSTEM_PROMPT)
        .with_message(MessageRole::User, build_prompt(request))
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.ai_provider.complete(completion).await?;
        let text = strip_fence(&response.content);
        if text.is_empty() {
            return Err(DocumentError::EmptyResponse);
        }
        tracing::debug!(session_id = %request.session_id, chars = text.len(), "process document generated");
        Ok(text.to_string())
    }
}

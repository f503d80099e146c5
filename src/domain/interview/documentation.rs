//! Process documentation for a finished interview.
//!
//! A document generator may turn the transcript into structured prose. When
//! none is configured, or it fails, the answers are rendered as a plain
//! markdown transcript so a document is always produced.

use serde::Serialize;
use std::sync::Arc;

use super::Role;
use crate::domain::foundation::SessionId;
use crate::ports::{DocumentGenerator, DocumentRequest};

/// Heading of every fallback document.
pub const FALLBACK_TITLE: &str = "# Prozessdokumentation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessDocument {
    pub session_id: SessionId,
    pub role: Option<Role>,
    /// Markdown text.
    pub content: String,
    pub source: DocumentSource,
}

/// Renders the transcript as markdown, one bold question per answer.
pub fn render_fallback_document(request: &DocumentRequest) -> String {
    let mut doc = format!("{}\n\n", FALLBACK_TITLE);
    if let Some(role_name) = &request.role_name {
        doc.push_str(&format!("**Rolle:** {}\n\n", role_name));
    }
    doc.push_str("## Interview-Antworten\n\n");
    if request.transcript.is_empty() {
        doc.push_str("_Keine Antworten erfasst._\n");
        return doc;
    }
    for entry in &request.transcript {
        let answer = if entry.answer.trim().is_empty() {
            "Keine Antwort"
        } else {
            entry.answer.trim()
        };
        doc.push_str(&format!("**{}**\n{}\n\n", entry.question_text, answer));
    }
    doc
}

/// Calls the generator when present and degrades to the transcript.
#[derive(Clone, Default)]
pub struct ProcessDocumenter {
    generator: Option<Arc<dyn DocumentGenerator>>,
}

impl ProcessDocumenter {
    pub fn new(generator: Arc<dyn DocumentGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Documenter that always renders the transcript.
    pub fn unavailable() -> Self {
        Self { generator: None }
    }

    pub async fn document(&self, request: &DocumentRequest) -> ProcessDocument {
        let generated = match &self.generator {
            Some(generator) if !request.transcript.is_empty() => {
                match generator.generate_document(request).await {
                    Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                    Ok(_) => {
                        tracing::warn!(session_id = %request.session_id, "generator returned an empty document; rendering transcript");
                        None
                    }
                    Err(err) => {
                        tracing::warn!(session_id = %request.session_id, error = %err, "document generation failed; rendering transcript");
                        None
                    }
                }
            }
            _ => None,
        };

        let (content, source) = match generated {
            Some(text) => (text, DocumentSource::Model),
            None => (render_fallback_document(request), DocumentSource::Fallback),
        };
        ProcessDocument {
            session_id: request.session_id,
            role: request.role,
            content,
            source,
        }
    }
}

impl std::fmt::Debug for ProcessDocumenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessDocumenter")
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

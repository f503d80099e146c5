//! Question selection engine.
//!
//! The engine is the interview state machine. It owns no session state:
//! each call receives the session by mutable reference, advances it as far
//! as the current answers allow, and returns the next question (or `None`
//! once the interview is over).
//!
//! Selection runs as a bounded loop of ticks. A tick either settles on a
//! question, finishes the interview, or advances the phase and lets the
//! next tick continue in the same call. Classification happens inside the
//! intake tick once all nine intake questions are answered.

use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;

use super::classification::{
    ClassificationPolicy, ClassificationSource, RoleCandidate, RoleClassifier, RoleDecision,
    CLARIFICATION_BOOST,
};
use super::documentation::{ProcessDocument, ProcessDocumenter};
use super::extraction::FieldExtractor;
use super::intake::{IntakeTopic, INTAKE_QUESTION_COUNT};
use super::progress::{calculate_progress, ProgressReport};
use super::schema::{FieldRef, SchemaStore};
use super::session::InterviewSession;
use super::{AnsweredQuestion, FieldValue, InterviewPhase, Question, Role};
use crate::domain::foundation::{SessionId, ValidationError};
use crate::ports::{
    ContextRetriever, DocumentRequest, QuestionChunk, QuestionGenerator, QuestionRequest,
    QuestionTarget,
};

/// Default cap on role-specific questions per session.
pub const DEFAULT_MAX_ROLE_QUESTIONS: usize = 10;

/// Intake to role-specific takes two ticks; one spare.
const MAX_TICKS: usize = 3;

/// Answers passed to the generator as conversational context.
const HISTORY_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("no schema configured for role {0}")]
    SchemaNotFound(Role),

    #[error("question {0} was not asked in this session")]
    UnknownQuestion(String),

    #[error("question {0} is already answered")]
    AlreadyAnswered(String),

    #[error(transparent)]
    InvalidTransition(#[from] ValidationError),

    #[error("inconsistent session {session_id}: {reason}")]
    SessionInconsistency { session_id: SessionId, reason: String },
}

impl EngineError {
    fn inconsistency(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self::SessionInconsistency {
            session_id,
            reason: reason.into(),
        }
    }
}

/// Tunables for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub max_role_questions: usize,
    pub policy: ClassificationPolicy,
    /// Complete right after role assignment, skipping role questions.
    pub stop_after_classification: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_role_questions: DEFAULT_MAX_ROLE_QUESTIONS,
            policy: ClassificationPolicy::default(),
            stop_after_classification: false,
        }
    }
}

/// Result of [`InterviewEngine::process_answer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Fields filled from the answer beyond the question's own field.
    pub backfilled: Vec<String>,
}

/// Snapshot of an interview for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewStatus {
    pub session_id: SessionId,
    pub phase: InterviewPhase,
    pub role: Option<Role>,
    pub role_low_confidence: bool,
    pub role_candidates: Vec<RoleCandidate>,
    pub classification_source: Option<ClassificationSource>,
    pub answered: usize,
    /// Fields holding a value, including backfilled ones.
    pub fields_filled: usize,
    pub intake_asked: usize,
    pub clarifying_asked: usize,
    pub role_asked: usize,
    pub max_role_questions: usize,
    pub progress: Option<ProgressReport>,
}

/// Which list a freshly composed question is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Intake,
    Role,
}

/// A new question whose wording still has to be produced.
#[derive(Debug)]
struct Draft {
    slot: Slot,
    /// Complete question carrying the fallback wording.
    question: Question,
    request: QuestionRequest,
}

#[derive(Debug)]
enum Tick {
    /// Phase changed; run another tick.
    Advanced,
    /// Return an already recorded question.
    Ask(Question),
    /// Word and record a new question.
    Compose(Draft),
    /// Interview is over.
    Finished,
}

#[derive(Clone)]
pub struct InterviewEngine {
    schemas: Arc<SchemaStore>,
    generator: Option<Arc<dyn QuestionGenerator>>,
    classifier: RoleClassifier,
    extractor: FieldExtractor,
    retriever: Option<Arc<dyn ContextRetriever>>,
    documenter: ProcessDocumenter,
    config: EngineConfig,
}

impl InterviewEngine {
    /// Engine with canned wording, fallback classification and no
    /// extraction. Use the `with_*` methods to plug in backends.
    pub fn new(schemas: Arc<SchemaStore>) -> Self {
        Self {
            schemas,
            generator: None,
            classifier: RoleClassifier::unavailable(),
            extractor: FieldExtractor::disabled(),
            retriever: None,
            documenter: ProcessDocumenter::unavailable(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_classifier(mut self, classifier: RoleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_documenter(mut self, documenter: ProcessDocumenter) -> Self {
        self.documenter = documenter;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    /// Selects the next question, advancing the session as needed.
    ///
    /// Returns the same question again while it is unanswered. Returns
    /// `None` once the session is complete.
    pub async fn next_question(
        &self,
        session: &mut InterviewSession,
    ) -> Result<Option<Question>, EngineError> {
        let draft = match self.settle(session).await? {
            Tick::Compose(draft) => draft,
            Tick::Ask(question) => return Ok(Some(question)),
            _ => return Ok(None),
        };
        let wording = self.word(&draft.request).await;
        Ok(Some(commit(session, draft, wording)))
    }

    /// Like [`Self::next_question`], forwarding partial wording to
    /// `on_delta` as it arrives. The question is recorded only after the
    /// generator's final chunk.
    pub async fn next_question_streaming<F>(
        &self,
        session: &mut InterviewSession,
        mut on_delta: F,
    ) -> Result<Option<Question>, EngineError>
    where
        F: FnMut(&str) + Send,
    {
        let draft = match self.settle(session).await? {
            Tick::Compose(draft) => draft,
            Tick::Ask(question) => return Ok(Some(question)),
            _ => return Ok(None),
        };
        let wording = self.word_streaming(&draft.request, &mut on_delta).await;
        Ok(Some(commit(session, draft, wording)))
    }

    /// Records an answer and fills the question's field.
    ///
    /// Answers to role questions are also offered to the field extractor;
    /// extracted values only fill fields that are still open.
    pub async fn process_answer(
        &self,
        session: &mut InterviewSession,
        question_id: &str,
        value: FieldValue,
    ) -> Result<AnswerOutcome, EngineError> {
        let question = session
            .find_question(question_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))?;
        if session.is_answered(question_id) {
            return Err(EngineError::AlreadyAnswered(question_id.to_string()));
        }

        session.record_answer(question_id, value.clone());
        tracing::debug!(session_id = %session.id(), question_id, "answer recorded");

        let mut outcome = AnswerOutcome::default();
        let Some(field_id) = question.field_id.as_deref() else {
            return Ok(outcome);
        };
        session.fill_field(field_id, value.clone());

        let Some(role) = session.role() else {
            return Ok(outcome);
        };
        let schema = self
            .schemas
            .load(role)
            .map_err(|_| EngineError::SchemaNotFound(role))?;
        let extracted = self
            .extractor
            .extract(schema, &value, field_id, session.filled_fields())
            .await;
        for (extra_id, extra_value) in extracted {
            if extra_id != field_id && session.fill_if_unfilled(&extra_id, extra_value) {
                outcome.backfilled.push(extra_id);
            }
        }
        if !outcome.backfilled.is_empty() {
            tracing::info!(
                session_id = %session.id(),
                question_id,
                backfilled = ?outcome.backfilled,
                "answer filled additional fields"
            );
        }
        Ok(outcome)
    }

    /// Interprets raw input against the question's type, then records it.
    pub async fn process_text_answer(
        &self,
        session: &mut InterviewSession,
        question_id: &str,
        raw: &str,
    ) -> Result<AnswerOutcome, EngineError> {
        let value = session
            .find_question(question_id)
            .map(|question| question.interpret_answer(raw))
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))?;
        self.process_answer(session, question_id, value).await
    }

    pub fn status(&self, session: &InterviewSession) -> Result<InterviewStatus, EngineError> {
        let progress = match session.role() {
            Some(role) => {
                let schema = self
                    .schemas
                    .load(role)
                    .map_err(|_| EngineError::SchemaNotFound(role))?;
                Some(calculate_progress(schema, session.filled_fields()))
            }
            None => None,
        };
        Ok(InterviewStatus {
            session_id: session.id(),
            phase: session.phase(),
            role: session.role(),
            role_low_confidence: session.role_low_confidence(),
            role_candidates: session.role_candidates().to_vec(),
            classification_source: session.classification_source(),
            answered: session.answers().len(),
            fields_filled: session.filled_fields().filled_count(),
            intake_asked: session.intake_questions().len(),
            clarifying_asked: session.clarifying_questions().len(),
            role_asked: session.role_questions().len(),
            max_role_questions: self.config.max_role_questions,
            progress,
        })
    }

    /// Writes process documentation from the session's answered questions.
    ///
    /// Works in any phase; an unfinished interview yields a partial document.
    pub async fn document(&self, session: &InterviewSession) -> Result<ProcessDocument, EngineError> {
        let mut request = DocumentRequest::new(session.id(), session.answered_questions());
        if let Some(role) = session.role() {
            let schema = self
                .schemas
                .load(role)
                .map_err(|_| EngineError::SchemaNotFound(role))?;
            request = request.with_role(role, schema.role_name.clone());
        }
        if !session.is_complete() {
            tracing::info!(session_id = %session.id(), phase = %session.phase(), "documenting an unfinished interview");
        }
        Ok(self.documenter.document(&request).await)
    }

    // ----- Selection -----

    /// Runs ticks until one settles on a question or finishes.
    async fn settle(&self, session: &mut InterviewSession) -> Result<Tick, EngineError> {
        for _ in 0..MAX_TICKS {
            let tick = match session.phase() {
                InterviewPhase::Intake => self.intake_tick(session).await?,
                InterviewPhase::RoleSpecific => self.role_tick(session).await?,
                InterviewPhase::Complete => Tick::Finished,
            };
            if !matches!(tick, Tick::Advanced) {
                return Ok(tick);
            }
        }
        debug_assert!(false, "phase did not settle within {} ticks", MAX_TICKS);
        Err(EngineError::inconsistency(session.id(), "phase did not settle"))
    }

    async fn intake_tick(&self, session: &mut InterviewSession) -> Result<Tick, EngineError> {
        if let Some(question) = session.pending_intake_question() {
            return Ok(Tick::Ask(question.clone()));
        }

        let asked = session.intake_questions().len();
        if asked < INTAKE_QUESTION_COUNT {
            let Some(topic) = IntakeTopic::at(asked) else {
                return Err(EngineError::inconsistency(session.id(), "intake schedule exhausted"));
            };
            let target = QuestionTarget::Intake {
                topic,
                number: asked + 1,
            };
            let request =
                QuestionRequest::new(session.id(), target).with_history(recent_history(session));
            return Ok(Tick::Compose(Draft {
                slot: Slot::Intake,
                question: topic.canned_question(),
                request,
            }));
        }

        if let Some(question) = session.pending_clarifying_question() {
            return Ok(Tick::Ask(question.clone()));
        }
        self.classify(session).await
    }

    /// Classifies the discovery answers and applies the acceptance policy.
    async fn classify(&self, session: &mut InterviewSession) -> Result<Tick, EngineError> {
        let answers = session.discovery_answers();
        let mut result = self.classifier.classify(&answers).await;

        if result.source == ClassificationSource::Fallback {
            for clarifying in session.clarifying_questions() {
                let chosen = session
                    .answer(clarifying.id())
                    .and_then(|answer| clarifying.role_for_answer(answer));
                if let Some(role) = chosen {
                    result.boost(role, CLARIFICATION_BOOST);
                }
            }
        }
        session.record_classification(&result);

        match self.config.policy.decide(&result, session.clarifying_questions()) {
            RoleDecision::Accept(role) => {
                tracing::info!(session_id = %session.id(), role = %role, "role assigned");
                session.assign_role(role, false)?;
                Ok(Tick::Advanced)
            }
            RoleDecision::Clarify(clarifying) => {
                tracing::info!(
                    session_id = %session.id(),
                    question_id = clarifying.id(),
                    roles = ?clarifying.roles,
                    "classification below threshold; asking clarifying question"
                );
                let question = clarifying.question.clone();
                session.push_clarifying_question(clarifying);
                Ok(Tick::Ask(question))
            }
            RoleDecision::AcceptLowConfidence(role) => {
                tracing::warn!(
                    session_id = %session.id(),
                    role = %role,
                    clarifying_asked = session.clarifying_questions().len(),
                    "role assigned with low confidence"
                );
                session.assign_role(role, true)?;
                Ok(Tick::Advanced)
            }
        }
    }

    async fn role_tick(&self, session: &mut InterviewSession) -> Result<Tick, EngineError> {
        let Some(role) = session.role() else {
            debug_assert!(false, "role-specific phase without a role");
            return Err(EngineError::inconsistency(
                session.id(),
                "role-specific phase without a role",
            ));
        };
        if let Some(question) = session.pending_role_question() {
            return Ok(Tick::Ask(question.clone()));
        }
        if self.config.stop_after_classification {
            tracing::info!(session_id = %session.id(), "stopping after classification");
            session.complete()?;
            return Ok(Tick::Finished);
        }

        let schema = self
            .schemas
            .load(role)
            .map_err(|_| EngineError::SchemaNotFound(role))?;
        let progress = calculate_progress(schema, session.filled_fields());
        if progress.is_complete {
            tracing::info!(session_id = %session.id(), "all required fields filled");
            session.complete()?;
            return Ok(Tick::Finished);
        }
        if session.role_questions().len() >= self.config.max_role_questions {
            tracing::info!(
                session_id = %session.id(),
                missing = progress.missing_required.len(),
                "role question cap reached"
            );
            session.complete()?;
            return Ok(Tick::Finished);
        }
        let Some(field) = schema.next_unfilled_field(session.filled_fields()) else {
            tracing::info!(session_id = %session.id(), "no askable field left");
            session.complete()?;
            return Ok(Tick::Finished);
        };

        let number = session.role_questions().len() + 1;
        let question = field_question(role, number, field);
        let context = match &self.retriever {
            Some(retriever) => retriever.lookup(Some(role), &field.definition.question).await,
            None => None,
        };
        let target = QuestionTarget::Field {
            role,
            theme_name: field.theme_name.to_string(),
            field_id: field.field_id().to_string(),
            canonical_question: field.definition.question.clone(),
            question_type: field.definition.field_type,
            options: field.definition.options.clone(),
            hint: field.definition.hint.clone(),
        };
        let request = QuestionRequest::new(session.id(), target)
            .with_history(recent_history(session))
            .with_context(context);
        Ok(Tick::Compose(Draft {
            slot: Slot::Role,
            question,
            request,
        }))
    }

    // ----- Wording -----

    async fn word(&self, request: &QuestionRequest) -> Option<String> {
        let generator = self.generator.as_ref()?;
        match generator.generate_question(request).await {
            Ok(text) => usable(text),
            Err(err) => {
                tracing::warn!(error = %err, "question generation failed; using canned text");
                None
            }
        }
    }

    async fn word_streaming<F>(&self, request: &QuestionRequest, on_delta: &mut F) -> Option<String>
    where
        F: FnMut(&str) + Send,
    {
        let generator = self.generator.as_ref()?;
        let mut stream = match generator.generate_question_stream(request).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "question stream failed to start; using canned text");
                return None;
            }
        };
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(QuestionChunk::Delta(delta)) => on_delta(&delta),
                Ok(QuestionChunk::Final(text)) => return usable(text),
                Err(err) => {
                    tracing::warn!(error = %err, "question stream failed; using canned text");
                    return None;
                }
            }
        }
        tracing::warn!("question stream ended without final text; using canned text");
        None
    }
}

impl std::fmt::Debug for InterviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewEngine")
            .field("roles", &self.schemas.roles())
            .field("generator", &self.generator.is_some())
            .field("classifier", &self.classifier)
            .field("retriever", &self.retriever.is_some())
            .field("documenter", &self.documenter)
            .field("config", &self.config)
            .finish()
    }
}

fn usable(text: String) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        tracing::warn!("generator returned empty text; using canned text");
        None
    } else {
        Some(text.to_string())
    }
}

/// Appends the drafted question with its final wording.
fn commit(session: &mut InterviewSession, draft: Draft, wording: Option<String>) -> Question {
    let question = match wording {
        Some(text) => draft.question.reworded(text),
        None => draft.question,
    };
    match draft.slot {
        Slot::Intake => session.push_intake_question(question.clone()),
        Slot::Role => session.push_role_question(question.clone()),
    }
    question
}

fn field_question(role: Role, number: usize, field: FieldRef<'_>) -> Question {
    let definition = field.definition;
    let question = Question::new(
        format!("role_{}_q{}", role.as_str(), number),
        definition.question.clone(),
        definition.field_type,
    )
    .with_options(definition.options.iter().cloned())
    .with_field(field.field_id())
    .with_theme(field.theme_id, field.theme_name)
    .with_required(definition.required);
    match &definition.hint {
        Some(hint) => question.with_hint(hint.clone()),
        None => question,
    }
}

fn recent_history(session: &InterviewSession) -> Vec<AnsweredQuestion> {
    let mut answered = session.answered_questions();
    let skip = answered.len().saturating_sub(HISTORY_WINDOW);
    answered.drain(..skip);
    answered
}

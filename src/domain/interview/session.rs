//! Interview session aggregate.
//!
//! The session is the only state an interview has. The engine receives it
//! by mutable reference each turn and keeps nothing between calls, so a
//! session can be persisted as plain data and resumed anywhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classification::{ClarifyingQuestion, ClassificationResult, ClassificationSource, RoleCandidate};
use super::intake::INTAKE_QUESTION_COUNT;
use super::{AnsweredQuestion, FieldValue, FilledFields, InterviewPhase, Question, Role};
use crate::domain::foundation::{SessionId, StateMachine, Timestamp, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    id: SessionId,
    #[serde(default)]
    phase: InterviewPhase,
    #[serde(default)]
    answers: BTreeMap<String, FieldValue>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    role_candidates: Vec<RoleCandidate>,
    #[serde(default)]
    role_low_confidence: bool,
    #[serde(default)]
    classification_explanation: Option<String>,
    #[serde(default)]
    classification_source: Option<ClassificationSource>,
    #[serde(default)]
    intake_questions: Vec<Question>,
    #[serde(default)]
    role_questions: Vec<Question>,
    #[serde(default)]
    filled_fields: FilledFields,
    #[serde(default)]
    clarifying_questions: Vec<ClarifyingQuestion>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl InterviewSession {
    /// Fresh session in the intake phase.
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            phase: InterviewPhase::Intake,
            answers: BTreeMap::new(),
            role: None,
            role_candidates: Vec::new(),
            role_low_confidence: false,
            classification_explanation: None,
            classification_source: None,
            intake_questions: Vec::new(),
            role_questions: Vec::new(),
            filled_fields: FilledFields::new(),
            clarifying_questions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ----- Accessors -----

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    pub fn answers(&self) -> &BTreeMap<String, FieldValue> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&FieldValue> {
        self.answers.get(question_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn role_candidates(&self) -> &[RoleCandidate] {
        &self.role_candidates
    }

    pub fn role_low_confidence(&self) -> bool {
        self.role_low_confidence
    }

    pub fn classification_explanation(&self) -> Option<&str> {
        self.classification_explanation.as_deref()
    }

    pub fn classification_source(&self) -> Option<ClassificationSource> {
        self.classification_source
    }

    pub fn intake_questions(&self) -> &[Question] {
        &self.intake_questions
    }

    pub fn role_questions(&self) -> &[Question] {
        &self.role_questions
    }

    pub fn filled_fields(&self) -> &FilledFields {
        &self.filled_fields
    }

    pub fn clarifying_questions(&self) -> &[ClarifyingQuestion] {
        &self.clarifying_questions
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_complete(&self) -> bool {
        self.phase == InterviewPhase::Complete
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    /// Any question this session has asked, by id.
    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.intake_questions
            .iter()
            .chain(self.clarifying_questions.iter().map(|c| &c.question))
            .chain(self.role_questions.iter())
            .find(|q| q.id == question_id)
    }

    pub fn pending_intake_question(&self) -> Option<&Question> {
        self.intake_questions.iter().find(|q| !self.is_answered(&q.id))
    }

    pub fn pending_clarifying_question(&self) -> Option<&Question> {
        self.clarifying_questions
            .iter()
            .map(|c| &c.question)
            .find(|q| !self.is_answered(&q.id))
    }

    pub fn pending_role_question(&self) -> Option<&Question> {
        self.role_questions.iter().find(|q| !self.is_answered(&q.id))
    }

    /// Intake and clarifying questions with their answers, in asking order.
    pub fn discovery_answers(&self) -> Vec<AnsweredQuestion> {
        let clarifying = self.clarifying_questions.iter().map(|c| &c.question);
        self.answered(self.intake_questions.iter().chain(clarifying))
    }

    /// Every answered question, intake first.
    pub fn answered_questions(&self) -> Vec<AnsweredQuestion> {
        let clarifying = self.clarifying_questions.iter().map(|c| &c.question);
        self.answered(
            self.intake_questions
                .iter()
                .chain(clarifying)
                .chain(self.role_questions.iter()),
        )
    }

    fn answered<'a>(&self, questions: impl Iterator<Item = &'a Question>) -> Vec<AnsweredQuestion> {
        questions
            .filter_map(|q| {
                self.answers.get(&q.id).map(|answer| AnsweredQuestion {
                    question_id: q.id.clone(),
                    question_text: q.text.clone(),
                    answer: answer.raw_text(),
                })
            })
            .collect()
    }

    // ----- Mutations (engine only) -----

    pub(crate) fn push_intake_question(&mut self, question: Question) {
        debug_assert!(self.intake_questions.len() < INTAKE_QUESTION_COUNT);
        self.intake_questions.push(question);
        self.touch();
    }

    pub(crate) fn push_clarifying_question(&mut self, question: ClarifyingQuestion) {
        self.clarifying_questions.push(question);
        self.touch();
    }

    pub(crate) fn push_role_question(&mut self, question: Question) {
        self.role_questions.push(question);
        self.touch();
    }

    /// Records an answer. Callers check [`Self::is_answered`] first.
    pub(crate) fn record_answer(&mut self, question_id: &str, value: FieldValue) {
        debug_assert!(!self.is_answered(question_id));
        self.answers.insert(question_id.to_string(), value);
        self.touch();
    }

    pub(crate) fn fill_field(&mut self, field_id: &str, value: FieldValue) {
        self.filled_fields.insert(field_id, value);
    }

    pub(crate) fn fill_if_unfilled(&mut self, field_id: &str, value: FieldValue) -> bool {
        self.filled_fields.insert_if_unfilled(field_id, value)
    }

    pub(crate) fn record_classification(&mut self, result: &ClassificationResult) {
        self.role_candidates = result.candidates.clone();
        self.classification_explanation = Some(result.explanation.clone());
        self.classification_source = Some(result.source);
        self.touch();
    }

    /// Assigns the role and enters the role-specific phase.
    pub(crate) fn assign_role(&mut self, role: Role, low_confidence: bool) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(InterviewPhase::RoleSpecific)?;
        self.role = Some(role);
        self.role_low_confidence = low_confidence;
        self.touch();
        Ok(())
    }

    /// Moves to the terminal phase. Completing twice is a no-op.
    pub(crate) fn complete(&mut self) -> Result<(), ValidationError> {
        if self.phase != InterviewPhase::Complete {
            self.phase = self.phase.transition_to(InterviewPhase::Complete)?;
            self.touch();
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

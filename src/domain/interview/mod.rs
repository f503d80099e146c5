//! Interview domain module.
//!
//! A structured interview runs in three phases: a fixed intake that
//! gathers role signals, a classification step that assigns one of three
//! roles, and schema-driven role questions until the role's required
//! fields are filled or the question cap is reached.
//!
//! # Components
//!
//! - `SchemaStore` - Per-role themes, fields, conditions and completion criteria
//! - `calculate_progress` - Completion percentage and missing required fields
//! - `RoleClassifier` / `ClassificationPolicy` - Scores and the acceptance rules around them
//! - `FieldExtractor` - Best-effort backfill of several fields from one answer
//! - `InterviewEngine` - The state machine selecting the next question
//! - `InterviewSession` - All per-interview state, as plain data
//! - `ProcessDocumenter` - Process documentation from the finished transcript

mod classification;
mod documentation;
mod engine;
mod extraction;
mod field_value;
mod intake;
mod phase;
mod progress;
mod question;
mod role;
pub mod schema;
mod session;

pub use classification::{
    ClarifyingQuestion, ClassificationPolicy, ClassificationResult, ClassificationSource,
    RawCandidate, RawClassification, RoleCandidate, RoleClassifier, RoleDecision,
    CLARIFICATION_BOOST, FALLBACK_DISTRIBUTION, MAX_CLARIFYING_QUESTIONS,
};
pub use documentation::{
    render_fallback_document, DocumentSource, ProcessDocument, ProcessDocumenter, FALLBACK_TITLE,
};
pub use engine::{
    AnswerOutcome, EngineConfig, EngineError, InterviewEngine, InterviewStatus,
    DEFAULT_MAX_ROLE_QUESTIONS,
};
pub use extraction::{
    ExtractionConfidence, FieldExtractor, FieldInferenceOutput, FieldInferenceRequest, OpenField,
};
pub use field_value::{FieldValue, FilledFields};
pub use intake::{is_affirmative, IntakeTopic, INTAKE_QUESTION_COUNT, YES_NO_OPTIONS};
pub use phase::InterviewPhase;
pub use progress::{calculate_progress, render_progress, ProgressReport, ThemeProgress};
pub use question::{AnsweredQuestion, Question, QuestionType};
pub use role::{Role, UnknownRole};
pub use schema::{
    CompletionCriteria, FieldCondition, FieldDefinition, FieldRef, RoleSchema, SchemaError,
    SchemaStore, Theme, ThemeSummary,
};
pub use session::InterviewSession;

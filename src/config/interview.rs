//! Interview flow configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::interview::{
    ClassificationPolicy, EngineConfig, DEFAULT_MAX_ROLE_QUESTIONS, MAX_CLARIFYING_QUESTIONS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Upper bound on role-specific questions per session
    #[serde(default = "default_max_role_questions")]
    pub max_role_questions: usize,

    /// Minimum classifier score for accepting a role outright
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_max_clarifying_questions")]
    pub max_clarifying_questions: usize,

    /// Complete right after role assignment (demo mode)
    #[serde(default)]
    pub stop_after_classification: bool,

    /// Directory with `role_schema_*` files overriding the built-in schemas
    pub schema_dir: Option<PathBuf>,

    /// Directory with `.txt`/`.md` background knowledge for question wording
    pub knowledge_dir: Option<PathBuf>,
}

impl InterviewConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_role_questions: self.max_role_questions,
            policy: ClassificationPolicy::new(self.confidence_threshold, self.max_clarifying_questions),
            stop_after_classification: self.stop_after_classification,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_role_questions == 0 {
            return Err(ValidationError::InvalidMaxRoleQuestions);
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(ValidationError::InvalidConfidenceThreshold);
        }
        if self.max_clarifying_questions > MAX_CLARIFYING_QUESTIONS {
            return Err(ValidationError::TooManyClarifyingQuestions);
        }
        Ok(())
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_role_questions: default_max_role_questions(),
            confidence_threshold: default_confidence_threshold(),
            max_clarifying_questions: default_max_clarifying_questions(),
            stop_after_classification: false,
            schema_dir: None,
            knowledge_dir: None,
        }
    }
}

fn default_max_role_questions() -> usize {
    DEFAULT_MAX_ROLE_QUESTIONS
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_max_clarifying_questions() -> usize {
    MAX_CLARIFYING_QUESTIONS
}

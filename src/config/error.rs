//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid AI request timeout")]
    InvalidTimeout,

    #[error("Invalid AI base URL format")]
    InvalidBaseUrl,

    #[error("Retry count exceeds maximum allowed (5)")]
    TooManyRetries,

    #[error("Confidence threshold must be within (0, 1]")]
    InvalidConfidenceThreshold,

    #[error("At most 3 clarifying questions are allowed")]
    TooManyClarifyingQuestions,

    #[error("At least one role-specific question is required")]
    InvalidMaxRoleQuestions,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}

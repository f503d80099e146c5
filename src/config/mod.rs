//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `INTERVIEW_ORCHESTRATOR` prefix and nested values use double underscores as
//! separators. Every section has defaults, so an empty environment yields an
//! offline interview with in-memory sessions.
//!
//! # Example
//!
//! ```no_run
//! use interview_orchestrator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Role question cap: {}", config.interview.max_role_questions);
//! ```

mod ai;
mod error;
mod interview;
mod logging;
mod storage;

pub use ai::{AiConfig, AiProvider};
pub use error::{ConfigError, ValidationError};
pub use interview::InterviewConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Environment variable prefix of all settings.
pub const ENV_PREFIX: &str = "INTERVIEW_ORCHESTRATOR";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Chat model provider (Mistral/OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Interview flow limits and schema location
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Session persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log filter and output format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `INTERVIEW_ORCHESTRATOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `INTERVIEW_ORCHESTRATOR__AI__API_KEY=...` -> `ai.api_key = ...`
    /// - `INTERVIEW_ORCHESTRATOR__INTERVIEW__MAX_ROLE_QUESTIONS=5` -> `interview.max_role_questions = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.interview.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// True when no API key is configured.
    pub fn is_offline(&self) -> bool {
        !self.ai.has_api_key()
    }
}

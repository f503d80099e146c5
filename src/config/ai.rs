//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::{OpenAICompatibleConfig, ProviderPreset};

/// AI provider configuration
///
/// Without an API key the interview runs offline: canned questions and the
/// fallback classification.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key of the chat completion service
    pub api_key: Option<Secret<String>>,

    #[serde(default)]
    pub provider: AiProvider,

    /// Model name; the provider's default when absent
    pub model: Option<String>,

    /// Base URL override, e.g. for a proxy
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries on transient failures. Zero means a single failure falls
    /// back immediately.
    #[serde(default)]
    pub max_retries: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Mistral,
    OpenAI,
}

impl AiProvider {
    fn preset(self) -> ProviderPreset {
        match self {
            Self::Mistral => ProviderPreset::Mistral,
            Self::OpenAI => ProviderPreset::OpenAI,
        }
    }
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Provider settings, or `None` in offline mode.
    pub fn provider_config(&self) -> Option<OpenAICompatibleConfig> {
        let key = self.api_key.as_ref().filter(|_| self.has_api_key())?;
        let mut config = OpenAICompatibleConfig::new(self.provider.preset(), key.expose_secret().trim())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries);
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        Some(config)
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_retries > 5 {
            return Err(ValidationError::TooManyRetries);
        }
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBaseUrl);
            }
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: AiProvider::default(),
            model: None,
            base_url: None,
            timeout_secs: default_timeout(),
            max_retries: 0,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

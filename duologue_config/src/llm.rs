//! Environment-sourced model settings.
//!
//! Secrets are read once at startup into an explicit [`LlmConfig`] value
//! shared read-only by every agent handle, never re-read ad hoc.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Supported hosted-model providers. Each maps to one named secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    DeepSeek,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
        }
    }
}

/// Remote model endpoint settings shared by all agent handles.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    pub max_tokens: usize,
}

/// Response-size cap for demo exchanges.
const DEFAULT_MAX_TOKENS: usize = 50;

impl LlmConfig {
    /// Build settings for `provider` from the process environment. Fails
    /// if the provider's secret is absent.
    pub fn from_env(provider: ProviderKind) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |var| std::env::var(var).ok())
    }

    fn from_lookup<F>(provider: ProviderKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let api_key = lookup(provider.env_var())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecret(provider.env_var()))?;

        Ok(Self {
            provider,
            model: provider.default_model().to_string(),
            api_key,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Override the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Override the response-size limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

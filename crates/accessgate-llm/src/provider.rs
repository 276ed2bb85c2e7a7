//! LLM provider trait.

use async_trait::async_trait;
use std::fmt;

use crate::error::LlmResult;
use crate::types::Message;

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Model in use.
    fn model(&self) -> &str;

    /// Complete a conversation and return the model's text.
    async fn complete(&self, system: &str, messages: &[Message]) -> LlmResult<String>;
}

#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(&self, system: &str, messages: &[Message]) -> LlmResult<String> {
        (**self).complete(system, messages).await
    }
}

/// Configuration for LLM providers.
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Temperature (0.0 - 1.0).
    pub temperature: f64,
    /// API endpoint override.
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("has_api_key", &!self.api_key.is_empty())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a config with an API key and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 1024,
            temperature: 0.0,
            base_url: None,
        }
    }

    /// Set max tokens.
    #[must_use]
    pub fn max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set temperature, clamped to `[0, 1]`.
    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp.clamp(0.0, 1.0);
        self
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

//! LLM Provider Port
//!
//! Abstract interface for language model invocations. The classifier,
//! responder and summarizer are all built on `complete`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, Turn};

/// Requested shape of the model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    /// Strict JSON matching `schema`
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

impl ResponseFormat {
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self::JsonSchema {
            name: name.into(),
            schema,
        }
    }

    /// Schema name for structured requests
    pub fn schema_name(&self) -> Option<&str> {
        match self {
            Self::Text => None,
            Self::JsonSchema { name, .. } => Some(name),
        }
    }
}

/// Options for LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(512),
            temperature: Some(0.7),
            response_format: ResponseFormat::Text,
        }
    }
}

impl CompletionOptions {
    /// Deterministic structured output
    pub fn structured(format: ResponseFormat) -> Self {
        Self {
            max_tokens: Some(512),
            temperature: Some(0.0),
            response_format: format,
        }
    }
}

/// Response from LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Token usage statistics
    pub usage: TokenUsage,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// LLM Provider interface
///
/// # Example
///
/// ```rust,ignore
/// use bluebuddy::ports::LlmProvider;
///
/// struct OpenAiProvider { /* ... */ }
///
/// #[async_trait]
/// impl LlmProvider for OpenAiProvider {
///     async fn complete(&self, messages: &[Turn], options: &CompletionOptions)
///         -> Result<CompletionResponse, DomainError> {
///         // Call chat completions
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Turn],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError>;

    /// Generate a completion from a single user prompt
    async fn complete_prompt(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, DomainError> {
        let messages = vec![Turn::user(prompt)];
        let response = self.complete(&messages, options).await?;
        Ok(response.content)
    }

    /// Get the provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

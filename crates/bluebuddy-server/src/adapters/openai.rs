//! OpenAI chat completions adapter
//!
//! Implements `LlmProvider` over `POST /v1/chat/completions`. Structured
//! requests use `response_format: json_schema` in strict mode.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use bluebuddy::{
    CompletionOptions, CompletionResponse, DomainError, LlmProvider, ResponseFormat, TokenUsage,
    Turn,
};

const API_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DomainError::provider(PROVIDER, format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the API root (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn response_format(format: &ResponseFormat) -> Option<serde_json::Value> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::JsonSchema { name, schema } => Some(json!({
            "type": "json_schema",
            "json_schema": {
                "name": name,
                "strict": true,
                "schema": schema,
            }
        })),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Turn],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|turn| ChatMessage {
                    role: turn.role.to_string(),
                    content: &turn.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: response_format(&options.response_format),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                PROVIDER,
                format!("API returned {status}: {body}"),
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::MalformedModelOutput(format!("chat completion: {e}")))?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            DomainError::MalformedModelOutput("chat completion has no choices".to_string())
        })?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %body.model,
            total_tokens = usage.total_tokens,
            finish_reason = ?choice.finish_reason,
            "Chat completion received"
        );

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: body.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

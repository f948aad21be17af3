//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint exposing `/v1/chat/completions`, which
//! includes Ollama's compatibility layer, LM Studio, and vLLM.

use crate::error::{AnalyzerError, Result};
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderKind, Role,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Provider for OpenAI-compatible chat completion endpoints.
pub struct OpenAiCompatProvider {
    model: String,
    client: Client,
    base_url: String,
}

impl OpenAiCompatProvider {
    /// Create a provider for the given base URL and model.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_url(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            model: model.into(),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Convert internal request to chat API format.
    fn to_api_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        for message in &request.messages {
            let role = match message.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(ChatMessage {
                role: role.to_string(),
                content: message.content.clone(),
            });
        }

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request);

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&api_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalyzerError::ApiError {
                provider: "openai-compat".to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let api_response: ChatResponse =
            response.json().await.map_err(|e| AnalyzerError::ParseError {
                provider: "openai-compat".to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AnalyzerError::ParseError {
                provider: "openai-compat".to_string(),
                message: "response carried no choices".to_string(),
            })?;

        Ok(CompletionResponse {
            content: content.trim().to_string(),
            model: api_response.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenaiCompat
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Chat API types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

//! Ollama local LLM provider implementation.

use crate::error::{AnalyzerError, Result};
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderKind, Role,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Request timeout; local models can be slow to first token.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Ollama local LLM provider.
///
/// Connects to an Ollama instance via the classic generate API. Messages
/// are flattened into a single prompt with role prefixes.
pub struct OllamaProvider {
    model: String,
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_url("http://localhost:11434", "llama3.1:8b")
    }

    /// Create a new Ollama provider with custom URL and model.
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
            base_url: trim_base_url(base_url.into()),
        })
    }

    /// Convert internal request to Ollama API format.
    fn to_api_request(&self, request: &CompletionRequest) -> OllamaRequest {
        let mut prompt_parts = Vec::new();

        if let Some(system) = &request.system_prompt {
            prompt_parts.push(format!("System: {system}"));
        }

        for message in &request.messages {
            let prefix = match message.role {
                Role::User => "User:",
                Role::Assistant => "Assistant:",
                Role::System => "System:",
            };
            prompt_parts.push(format!("{prefix} {}", message.content));
        }

        prompt_parts.push("Assistant:".to_string());

        OllamaRequest {
            model: self.model.clone(),
            prompt: prompt_parts.join("\n\n"),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request
                    .max_tokens
                    .map(i32::try_from)
                    .transpose()
                    .ok()
                    .flatten(),
            },
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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
                provider: "ollama".to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let api_response: OllamaResponse =
            response.json().await.map_err(|e| AnalyzerError::ParseError {
                provider: "ollama".to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        Ok(CompletionResponse {
            content: api_response.response.trim().to_string(),
            model: api_response.model,
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
}

//! Analysis routing: heuristic baseline with an optional model-backed pass.

use crate::error::{AnalyzerError, Result};
use crate::heuristic;
use crate::provider::{CompletionRequest, LlmProvider, ProviderKind};
use crate::providers::{OllamaProvider, OpenAiCompatProvider};
use crate::report::{AnalysisReport, ProfileRecord, ReportMode};
use std::sync::Arc;
use tracing::warn;
use umbra_core::LlmConfig;

/// Bio excerpt length used when building the model prompt.
const BIO_EXCERPT_CHARS: usize = 220;

/// Which analysis path the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Keyword heuristics only
    Heuristic,
    /// Ask the configured model; fall back to heuristics on failure
    ModelBacked,
}

/// Analyzes found profiles, heuristically or via a configured LLM provider.
///
/// The heuristic result is always computed first and serves as the fallback:
/// a model failure downgrades the report to `heuristic_fallback` with the
/// failure reason attached, it never fails the analysis.
pub struct ProfileAnalyzer {
    provider: Option<Arc<dyn LlmProvider>>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    username_pivot: Option<String>,
    email_pivot: Option<String>,
}

impl std::fmt::Debug for ProfileAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileAnalyzer")
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("username_pivot", &self.username_pivot)
            .field("email_pivot", &self.email_pivot)
            .finish()
    }
}

impl ProfileAnalyzer {
    /// Create an analyzer without any model backend.
    #[must_use]
    pub fn heuristic_only() -> Self {
        Self {
            provider: None,
            max_tokens: None,
            temperature: None,
            username_pivot: None,
            email_pivot: None,
        }
    }

    /// Create an analyzer backed by the given provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
            max_tokens: None,
            temperature: None,
            username_pivot: None,
            email_pivot: None,
        }
    }

    /// Build an analyzer from the application's LLM configuration.
    ///
    /// A disabled configuration yields a heuristic-only analyzer.
    ///
    /// # Errors
    /// Returns error if the configured provider name is unknown or the
    /// provider cannot be constructed.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::heuristic_only());
        }

        let provider: Arc<dyn LlmProvider> = match config.provider.as_str() {
            "ollama" => Arc::new(OllamaProvider::with_url(&config.base_url, &config.model)?),
            "openai-compat" => Arc::new(OpenAiCompatProvider::with_url(
                &config.base_url,
                &config.model,
            )?),
            other => return Err(AnalyzerError::UnknownProvider(other.to_string())),
        };

        Ok(Self {
            provider: Some(provider),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
            username_pivot: None,
            email_pivot: None,
        })
    }

    /// Attach the scanned username as a pivot for the model prompt.
    #[must_use]
    pub fn with_username_pivot(mut self, username: impl Into<String>) -> Self {
        self.username_pivot = Some(username.into());
        self
    }

    /// Attach the source email as a pivot for the model prompt.
    #[must_use]
    pub fn with_email_pivot(mut self, email: impl Into<String>) -> Self {
        self.email_pivot = Some(email.into());
        self
    }

    /// Analyze a set of found profiles.
    ///
    /// # Errors
    /// Returns [`AnalyzerError::NoProfiles`] for an empty input list; model
    /// failures are recovered into the report instead of being returned.
    pub async fn analyze(
        &self,
        profiles: &[ProfileRecord],
        mode: AnalysisMode,
    ) -> Result<AnalysisReport> {
        if profiles.is_empty() {
            return Err(AnalyzerError::NoProfiles);
        }

        let mut report = heuristic::analyze(profiles);

        if mode == AnalysisMode::Heuristic {
            return Ok(report);
        }

        let Some(provider) = &self.provider else {
            report.mode = ReportMode::HeuristicFallback;
            report.llm_error = Some("no model provider configured".to_string());
            return Ok(report);
        };

        let request = self.build_request(profiles);
        report.llm_model = Some(provider.model().to_string());

        match provider.complete(request).await {
            Ok(response) if !response.content.is_empty() => {
                report.summary = response.content;
                report.mode = match provider.kind() {
                    ProviderKind::Ollama => ReportMode::Ollama,
                    ProviderKind::OpenaiCompat => ReportMode::OpenaiCompat,
                };
                report.llm_used = true;
            }
            Ok(_) => {
                warn!(model = provider.model(), "model returned an empty completion");
                report.mode = ReportMode::HeuristicFallback;
                report.llm_error = Some("model returned an empty completion".to_string());
            }
            Err(err) => {
                warn!(model = provider.model(), error = %err, "model-backed analysis failed");
                report.mode = ReportMode::HeuristicFallback;
                report.llm_error = Some(err.to_string());
            }
        }

        Ok(report)
    }

    /// Build the completion request for a set of profiles.
    fn build_request(&self, profiles: &[ProfileRecord]) -> CompletionRequest {
        let mut lines = vec![
            "Given multi-platform profile hits, infer persona, interests, and risk signals."
                .to_string(),
            "Keep it under 140 words.".to_string(),
        ];

        if let Some(username) = &self.username_pivot {
            lines.push(format!("Username pivot: {username}"));
        }
        if let Some(email) = &self.email_pivot {
            lines.push(format!("Email pivot: {email}"));
        }

        lines.push("Profiles:".to_string());
        for profile in profiles {
            let mut line = format!(
                "- {}: {} | {}",
                profile.platform,
                profile.display_name.as_deref().unwrap_or(""),
                profile.url.as_deref().unwrap_or(""),
            );
            if let Some(bio) = &profile.bio {
                let excerpt: String = bio.chars().take(BIO_EXCERPT_CHARS).collect();
                line.push_str(&format!(" | bio: {excerpt}"));
            }
            lines.push(line);
        }

        let mut request = CompletionRequest::new(lines.join("\n"))
            .with_system_prompt("You are a concise profile analyst.");
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

//! Umbra Analyzer - Profile summarization for scan results.
//!
//! This crate is the downstream collaborator of the scanner: it accepts the
//! list of found-profile records and produces a summary with inferred traits
//! and risk signals. Two paths exist:
//!
//! - **Heuristic**: keyword rules over platforms and bios; always available
//! - **Model-backed**: a completion from a local or OpenAI-compatible LLM
//!   endpoint via the [`LlmProvider`] trait
//!
//! Model-backed analysis is best-effort by contract: when the provider is
//! unreachable or misbehaves, the heuristic result is returned as the
//! authoritative answer and the failure reason is carried in
//! [`AnalysisReport::llm_error`], never silently dropped.
//!
//! # Example
//!
//! ```rust
//! use umbra_analyzer::{AnalysisMode, ProfileAnalyzer, ProfileRecord};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profiles = vec![ProfileRecord::new("GitHub")];
//! let analyzer = ProfileAnalyzer::heuristic_only();
//!
//! let report = analyzer.analyze(&profiles, AnalysisMode::Heuristic).await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod analyzer;
pub mod error;
#[allow(missing_docs)]
pub mod heuristic;
pub mod provider;
pub mod providers;
pub mod report;

// Re-export commonly used types
pub use analyzer::{AnalysisMode, ProfileAnalyzer};
pub use error::{AnalyzerError, Result};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Message, ProviderKind, Role,
};
pub use providers::{OllamaProvider, OpenAiCompatProvider};
pub use report::{AnalysisReport, ProfileRecord, ReportMode};

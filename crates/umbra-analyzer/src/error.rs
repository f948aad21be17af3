//! Error types for the analyzer subsystem.

use thiserror::Error;

/// Errors that can occur during profile analysis.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Analysis requested with an empty profile list
    #[error("no profiles to analyze")]
    NoProfiles,

    /// Configured provider name is not recognized
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    /// API error with status code
    #[error("API error ({provider}): status {status}, {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Response parsing error
    #[error("failed to parse response from {provider}: {message}")]
    ParseError {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

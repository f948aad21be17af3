//! Error types for the proxy subsystem.

use thiserror::Error;

/// Errors that can occur while configuring the proxy pool.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Proxy endpoint could not be parsed as a proxy URL
    #[error("invalid proxy endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        /// The offending endpoint string
        endpoint: String,
        /// Underlying parse error
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client construction failed for a proxy endpoint
    #[error("failed to build client for proxy '{endpoint}': {source}")]
    ClientBuild {
        /// The endpoint the client was being built for
        endpoint: String,
        /// Underlying builder error
        #[source]
        source: reqwest::Error,
    },
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

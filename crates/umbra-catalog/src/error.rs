//! Error types for the catalog subsystem.

use thiserror::Error;

/// Errors that can occur in catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Platform definition not found
    #[error("platform definition not found: {platform_id}")]
    NotFound {
        /// The platform ID that was not found
        platform_id: String,
    },

    /// Failed to load platform definition from file
    #[error("failed to load platform definition from {path}: {source}")]
    LoadError {
        /// Path to the definition file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse platform definition TOML
    #[error("failed to parse platform definition TOML in {path}: {source}")]
    ParseError {
        /// Path to the definition file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Invalid platform definition (validation failed)
    #[error("invalid platform definition for {platform_id}: {reason}")]
    ValidationError {
        /// Platform ID being validated
        platform_id: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Platform definition directory not found
    #[error("platform catalog directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while accessing platform definitions
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid platform ID format
    #[error("invalid platform ID: {0}")]
    InvalidId(#[from] umbra_core::UmbraError),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

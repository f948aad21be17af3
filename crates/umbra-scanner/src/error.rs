//! Error types for the scanner subsystem.

use thiserror::Error;

/// Errors that can occur when setting up or dispatching a scan.
///
/// These are session-level failures reported to the caller before any probe
/// is dispatched. Per-probe failures are never errors: they are classified
/// into a terminal [`crate::ProbeStatus`] and delivered as ordinary events.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The platform catalog has no entries
    #[error("platform catalog is empty")]
    EmptyCatalog,

    /// A catalog entry's URL template is unusable
    #[error("invalid probe template for {platform}: {reason}")]
    InvalidTemplate {
        /// Platform the template belongs to
        platform: String,
        /// Why the template was rejected
        reason: String,
    },

    /// Catalog access failed
    #[error("catalog error: {0}")]
    Catalog(#[from] umbra_catalog::CatalogError),

    /// Proxy pool configuration failed
    #[error("proxy error: {0}")]
    Proxy(#[from] umbra_proxy::ProxyError),

    /// HTTP client construction failed
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;

//! Umbra Core - Foundation crate for the Umbra handle scanner.
//!
//! This crate provides shared types, error handling, and configuration
//! management that all other Umbra crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`Handle`, `PlatformId`)
//!
//! # Example
//!
//! ```rust
//! use umbra_core::{AppConfig, Handle};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (defaults if no file exists)
//! let config = AppConfig::default();
//! assert_eq!(config.scanning.max_concurrency, 8);
//!
//! // Validate a handle before scanning
//! let handle = Handle::new("alice")?;
//! assert_eq!(handle.as_str(), "alice");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, CatalogConfig, LlmConfig, ProxyConfig, RotationMode, ScanningConfig,
};
pub use error::{ConfigError, ConfigResult, Result, UmbraError};
pub use types::{Handle, PlatformId};

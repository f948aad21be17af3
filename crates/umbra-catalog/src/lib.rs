//! Umbra Catalog - Platform definition system for handle probing.
//!
//! This crate provides the core types and functionality for managing the
//! platform catalog. It handles loading TOML definition files, caching them
//! in memory, and providing query capabilities.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): Strongly-typed platform metadata,
//!   detection rules, and extraction rules
//! - **Loader** ([`loader`]): TOML file loading from `platform-catalog/`
//! - **Registry** ([`registry`]): In-memory cache preserving catalog order
//! - **Errors** ([`error`]): Catalog-specific error types
//!
//! # Example
//!
//! ```rust
//! use umbra_catalog::{PlatformLoader, PlatformRegistry};
//! use umbra_core::PlatformId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load platform definitions from the default directory
//! let loader = PlatformLoader::with_default_dir()?;
//! let registry = PlatformRegistry::load_from(&loader)?;
//!
//! // Query a specific platform
//! let platform_id = PlatformId::new("github")?;
//! let definition = registry.get(&platform_id)?;
//!
//! println!("Platform: {}", definition.name());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use definition::{
    DetectionRule, ExtractionRule, PlatformCategory, PlatformDefinition, PlatformMetadata,
};
pub use error::{CatalogError, Result};
pub use loader::PlatformLoader;
pub use registry::PlatformRegistry;

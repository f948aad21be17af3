//! Per-scan probe targets expanded from the catalog.

use crate::error::Result;
use crate::url_builder::build_probe_url;
use umbra_catalog::{DetectionRule, ExtractionRule, PlatformCategory, PlatformDefinition};
use umbra_core::{Handle, PlatformId};

/// One platform to probe for one handle.
///
/// Created once per scan from a catalog entry, with the handle substituted
/// into the URL template; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    /// Catalog identifier of the platform
    pub platform: PlatformId,
    /// Platform display name
    pub name: String,
    /// Catalog category
    pub category: PlatformCategory,
    /// Fully resolved probe URL
    pub url: String,
    /// Rule for judging existence
    pub detection: DetectionRule,
    /// Optional rule for extracting display metadata
    pub extraction: Option<ExtractionRule>,
}

impl ProbeTarget {
    /// Expand a catalog definition into a probe target for the given handle.
    ///
    /// # Errors
    /// Returns error if the definition's URL template has no `{handle}`
    /// placeholder.
    pub fn from_definition(definition: &PlatformDefinition, handle: &Handle) -> Result<Self> {
        let url = build_probe_url(
            &definition.platform.url_template,
            handle,
            definition.name(),
        )?;

        Ok(Self {
            platform: definition.id().clone(),
            name: definition.name().to_string(),
            category: definition.category(),
            url,
            detection: definition.detection.clone(),
            extraction: definition.extraction.clone(),
        })
    }
}

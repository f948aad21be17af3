//! Platform definition types and structures.
//!
//! This module defines the data structures for platform definitions loaded
//! from TOML files: where to probe for a handle and how to judge existence.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use umbra_core::PlatformId;

/// Complete platform definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformDefinition {
    /// Core platform metadata
    pub platform: PlatformMetadata,

    /// Rule for judging whether a handle exists on this platform
    pub detection: DetectionRule,

    /// Optional rule for extracting display metadata from a found profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionRule>,
}

impl PlatformDefinition {
    /// Get the platform ID.
    #[must_use]
    pub fn id(&self) -> &PlatformId {
        &self.platform.id
    }

    /// Get the platform name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.platform.name
    }

    /// Get the platform category.
    #[must_use]
    pub fn category(&self) -> PlatformCategory {
        self.platform.category
    }

    /// Validate the platform definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.platform.name.is_empty() {
            return Err(CatalogError::ValidationError {
                platform_id: self.platform.id.to_string(),
                reason: "platform name cannot be empty".to_string(),
            });
        }

        if !self.platform.url_template.contains("{handle}") {
            return Err(CatalogError::ValidationError {
                platform_id: self.platform.id.to_string(),
                reason: format!(
                    "url_template must contain a {{handle}} placeholder, got '{}'",
                    self.platform.url_template
                ),
            });
        }

        self.detection.validate(&self.platform.id)?;

        Ok(())
    }
}

/// Core platform metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMetadata {
    /// Unique platform identifier (e.g., "github", "stack-overflow")
    pub id: PlatformId,

    /// Human-readable platform name
    pub name: String,

    /// Platform category
    pub category: PlatformCategory,

    /// Profile URL template with a `{handle}` placeholder
    pub url_template: String,
}

/// Categories of platforms in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformCategory {
    /// Social networks (Instagram, Mastodon, etc.)
    Social,
    /// Developer platforms (GitHub, GitLab, etc.)
    Developer,
    /// Creative/portfolio platforms
    Creative,
    /// Gaming platforms and communities
    Gaming,
    /// Forums and discussion boards
    Forum,
    /// Music and audio platforms
    Music,
    /// Professional networks
    Professional,
    /// Other/uncategorized
    Other,
}

impl PlatformCategory {
    /// Get a human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Social => "Social",
            Self::Developer => "Developer",
            Self::Creative => "Creative",
            Self::Gaming => "Gaming",
            Self::Forum => "Forum",
            Self::Music => "Music",
            Self::Professional => "Professional",
            Self::Other => "Other",
        }
    }
}

/// Rule for judging whether a probe response indicates an existing profile.
///
/// Each catalog entry carries exactly one rule; a single generic classifier
/// in the scanner evaluates it against the HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum DetectionRule {
    /// A 2xx status within the given range means the profile exists
    StatusRange {
        /// Lowest status code treated as a hit (inclusive)
        found_min: u16,
        /// Highest status code treated as a hit (inclusive)
        found_max: u16,
    },

    /// A marker string whose presence in a 2xx body means the profile exists
    BodyContains {
        /// Case-insensitive marker to look for
        needle: String,
    },

    /// A marker string whose presence in a 2xx body means the profile does
    /// NOT exist (absence means it does)
    BodyAbsent {
        /// Case-insensitive not-found marker
        marker: String,
    },

    /// A redirect whose `Location` contains the fragment means the profile
    /// exists; any other redirect is reported as such
    RedirectTarget {
        /// Substring the redirect target must contain
        location_contains: String,
    },
}

impl DetectionRule {
    /// Validate the detection rule configuration.
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        match self {
            Self::StatusRange {
                found_min,
                found_max,
            } => {
                if found_min > found_max {
                    return Err(CatalogError::ValidationError {
                        platform_id: platform_id.to_string(),
                        reason: format!(
                            "status range is inverted: {found_min} > {found_max}"
                        ),
                    });
                }
                // Found is only ever assigned on a successful response
                if *found_min < 200 || *found_max > 299 {
                    return Err(CatalogError::ValidationError {
                        platform_id: platform_id.to_string(),
                        reason: format!(
                            "status range must lie within 200-299, got {found_min}-{found_max}"
                        ),
                    });
                }
            }
            Self::BodyContains { needle } => {
                if needle.is_empty() {
                    return Err(CatalogError::ValidationError {
                        platform_id: platform_id.to_string(),
                        reason: "body-contains needle cannot be empty".to_string(),
                    });
                }
            }
            Self::BodyAbsent { marker } => {
                if marker.is_empty() {
                    return Err(CatalogError::ValidationError {
                        platform_id: platform_id.to_string(),
                        reason: "body-absent marker cannot be empty".to_string(),
                    });
                }
            }
            Self::RedirectTarget { location_contains } => {
                if location_contains.is_empty() {
                    return Err(CatalogError::ValidationError {
                        platform_id: platform_id.to_string(),
                        reason: "redirect-target fragment cannot be empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// CSS selectors for extracting display metadata from a found profile page.
///
/// Selector resolution is attribute-aware: `content` (meta tags) and `src`
/// (images) are preferred over element text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Selector for the display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Selector for the bio/description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Selector for the avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ExtractionRule {
    /// Standard OpenGraph meta-tag selectors, which most profile pages carry.
    #[must_use]
    pub fn og_defaults() -> Self {
        Self {
            display_name: Some(r#"meta[property="og:title"]"#.to_string()),
            bio: Some(r#"meta[property="og:description"]"#.to_string()),
            avatar: Some(r#"meta[property="og:image"]"#.to_string()),
        }
    }

    /// Whether the rule defines any selector at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.bio.is_none() && self.avatar.is_none()
    }
}

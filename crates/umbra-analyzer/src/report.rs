//! Analysis input records and the report produced for them.

use serde::{Deserialize, Serialize};

/// One found profile handed to the analyzer.
///
/// This mirrors the found-profile payload of the scanner's terminal event,
/// without depending on it: callers convert at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Platform display name
    pub platform: String,
    /// Profile URL, if known
    #[serde(default)]
    pub url: Option<String>,
    /// Display name parsed from the profile page
    #[serde(default)]
    pub display_name: Option<String>,
    /// Short bio parsed from the profile page
    #[serde(default)]
    pub bio: Option<String>,
    /// Avatar URL parsed from the profile page
    #[serde(default)]
    pub avatar: Option<String>,
    /// Catalog category of the platform
    #[serde(default)]
    pub category: Option<String>,
}

impl ProfileRecord {
    /// Create a record with only the platform name set.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: None,
            display_name: None,
            bio: None,
            avatar: None,
            category: None,
        }
    }
}

/// Which path produced the authoritative summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Heuristic analysis, as requested
    Heuristic,
    /// Ollama completion
    Ollama,
    /// OpenAI-compatible completion
    OpenaiCompat,
    /// Model-backed analysis was requested but failed; heuristic result
    /// returned as authoritative
    HeuristicFallback,
}

/// Result of analyzing a set of found profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Narrative summary of the footprint
    pub summary: String,
    /// Inferred traits
    pub traits: Vec<String>,
    /// Inferred risk signals
    pub risks: Vec<String>,
    /// Which path produced the summary
    pub mode: ReportMode,
    /// Whether a model completion is part of this report
    pub llm_used: bool,
    /// Model that was asked, when model-backed analysis was attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Failure reason when the model-backed path was unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
}

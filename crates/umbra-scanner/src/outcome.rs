//! Probe outcomes, stream events, and scan reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use umbra_catalog::PlatformCategory;

/// Status classification of one probe.
///
/// Exactly one value per [`ProbeOutcome`]. `Found` is only assigned when the
/// platform's detection rule matched against a successful response (2xx, or
/// an accepted redirect-to-profile); every ambiguous or infrastructure-level
/// failure maps to one of the remaining kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Profile exists on the platform
    Found,
    /// Profile does not exist
    NotFound,
    /// Response received but neither rule polarity matched cleanly
    Unknown,
    /// Access denied, block page, or no eligible proxy
    Blocked,
    /// Request timed out
    Timeout,
    /// Platform rate-limited the probe (HTTP 429)
    RateLimited,
    /// Platform returned a 5xx
    ServerError,
    /// Redirected somewhere other than an accepted profile target
    Redirect,
    /// Network-level failure other than a timeout
    Error,
}

impl ProbeStatus {
    /// Whether this status means the profile exists.
    #[must_use]
    pub fn is_found(self) -> bool {
        self == Self::Found
    }

    /// Wire name of the status (snake_case, matching serialization).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
            Self::Blocked => "blocked",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Redirect => "redirect",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of probing one platform for one handle.
///
/// Produced exactly once per platform per scan, after any internal retries;
/// immutable once created. `via_proxy` and `proxy_id` describe the final
/// attempt that produced this outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Platform display name
    pub site: String,
    /// Resolved probe URL
    pub url: String,
    /// Convenience flag equal to `state == found`
    pub found: bool,
    /// Status classification
    pub state: ProbeStatus,
    /// HTTP status code (0 if no response was received)
    pub status_code: u16,
    /// Whether the final attempt went through a proxy
    pub via_proxy: bool,
    /// Identifier of the proxy used on the final attempt, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
    /// Wall-clock latency of the final attempt in milliseconds
    pub latency_ms: Option<u64>,
    /// Free-text reason on failure or ambiguity
    pub reason: Option<String>,
    /// Display name parsed from the profile page, when available
    pub display_name: Option<String>,
    /// Short bio parsed from the profile page, when available
    pub bio: Option<String>,
    /// Avatar URL parsed from the profile page, when available
    pub avatar: Option<String>,
    /// Catalog category of the platform
    pub category: PlatformCategory,
}

/// One event in a scan's result stream.
///
/// A stream consists of one `site_result` per probed platform, delivered in
/// completion order, followed by exactly one `search_complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// One probe finished
    SiteResult(ProbeOutcome),
    /// All probes finished
    SearchComplete {
        /// Aggregate counts
        summary: ScanSummary,
        /// The found-filtered subset of delivered site results
        found_profiles: Vec<ProbeOutcome>,
    },
}

/// Aggregate counts carried by the terminal event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of platforms probed
    pub total: usize,
    /// Number of probes classified `found`
    pub found_count: usize,
}

/// Full result of a scan, returned by the non-streaming variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// The handle that was scanned
    pub handle: String,
    /// Number of platforms probed
    pub total: usize,
    /// Number of probes classified `found`
    pub found_count: usize,
    /// When the scan started
    pub started_at: DateTime<Utc>,
    /// When the last probe resolved
    pub finished_at: DateTime<Utc>,
    /// Every outcome, in completion order
    pub outcomes: Vec<ProbeOutcome>,
}

impl ScanReport {
    /// The found-filtered subset of outcomes.
    #[must_use]
    pub fn found_profiles(&self) -> Vec<&ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.found).collect()
    }
}

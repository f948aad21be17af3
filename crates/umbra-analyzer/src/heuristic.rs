use crate::report::{AnalysisReport, ProfileRecord, ReportMode};
use std::collections::HashSet;

/// Bios longer than this suggest deliberate self-presentation.
const LONG_BIO_CHARS: usize = 240;

/// Keyword analysis of found profiles: platform mix and bio contents are
/// folded into high-level traits and risk signals.
#[must_use]
pub fn analyze(profiles: &[ProfileRecord]) -> AnalysisReport {
    let total = profiles.len();
    let platforms: Vec<String> = profiles.iter().map(|p| p.platform.to_lowercase()).collect();
    let distinct: HashSet<&String> = platforms.iter().collect();
    let bios: Vec<&str> = profiles.iter().filter_map(|p| p.bio.as_deref()).collect();

    let mut traits = Vec::new();
    let mut risks = Vec::new();

    let any_platform =
        |needles: &[&str]| platforms.iter().any(|p| needles.iter().any(|n| p.contains(n)));

    if any_platform(&["github", "gitlab", "bitbucket", "codeberg"]) {
        traits.push("developer/tech footprint".to_string());
    }
    if any_platform(&["linkedin", "xing"]) {
        traits.push("professional identity".to_string());
    }
    if any_platform(&["instagram", "facebook", "tiktok", "mastodon", "bluesky"]) {
        traits.push("social presence".to_string());
    }
    if any_platform(&["patreon", "ko-fi", "venmo", "cash app", "buymeacoffee"]) {
        traits.push("creator/monetization signals".to_string());
    }
    if bios.iter().any(|b| b.len() > LONG_BIO_CHARS) {
        traits.push("long-form bio detected".to_string());
    }

    if distinct.len() <= 2 && total >= 3 {
        risks.push("identity reuse across few platforms".to_string());
    }
    if bios
        .iter()
        .any(|b| b.to_lowercase().contains("vpn") || b.to_lowercase().contains("proxy"))
    {
        risks.push("privacy tooling mentioned".to_string());
    }

    let summary = format!(
        "Found {total} profiles across {} platforms. \
         Signals combined into high-level traits and risks.",
        distinct.len()
    );

    AnalysisReport {
        summary,
        traits,
        risks,
        mode: ReportMode::Heuristic,
        llm_used: false,
        llm_model: None,
        llm_error: None,
    }
}

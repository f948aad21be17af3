use crate::outcome::ProbeStatus;
use umbra_catalog::DetectionRule;

/// Classification verdict for one received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub state: ProbeStatus,
    pub reason: Option<String>,
}

impl Verdict {
    fn found() -> Self {
        Self {
            state: ProbeStatus::Found,
            reason: None,
        }
    }

    fn of(state: ProbeStatus, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: Some(reason.into()),
        }
    }
}

/// Markers that identify an anti-bot block page regardless of status code.
const BLOCK_PAGE_MARKERS: &[&str] = &[
    "captcha",
    "cf-chl",
    "access denied",
    "unusual traffic",
    "are you a robot",
];

/// Whether a response body looks like a block page rather than site content.
fn is_block_page(body_lower: &str) -> bool {
    BLOCK_PAGE_MARKERS
        .iter()
        .any(|marker| body_lower.contains(marker))
}

/// Classify a received HTTP response against a platform's detection rule.
///
/// Infrastructure-level signals take priority over the rule: 429, explicit
/// denials and block pages, 5xx, and 404 are all classified before the rule
/// is consulted. Redirects are matched against `redirect-target` rules; a
/// plain success status is handed to the rule's positive/negative check.
/// Anything that survives all of that is `unknown`, never `found`.
///
/// Network failures never reach this function; the dispatcher maps them to
/// `timeout`/`error` directly.
pub fn classify_response(
    status: u16,
    location: Option<&str>,
    body: &str,
    rule: &DetectionRule,
) -> Verdict {
    let body_lower = body.to_lowercase();

    if status == 429 {
        return Verdict::of(ProbeStatus::RateLimited, "rate limited");
    }

    if status == 403 || status == 999 {
        return Verdict::of(ProbeStatus::Blocked, "access forbidden");
    }

    if is_block_page(&body_lower) {
        return Verdict::of(ProbeStatus::Blocked, "block page signature in response body");
    }

    if (500..600).contains(&status) {
        return Verdict::of(ProbeStatus::ServerError, format!("server error {status}"));
    }

    if status == 404 {
        return Verdict::of(ProbeStatus::NotFound, "profile not found");
    }

    if (300..400).contains(&status) {
        if let DetectionRule::RedirectTarget { location_contains } = rule {
            if location.is_some_and(|l| l.contains(location_contains.as_str())) {
                return Verdict::found();
            }
        }
        return Verdict::of(
            ProbeStatus::Redirect,
            format!("redirected to {}", location.unwrap_or("unknown")),
        );
    }

    if (200..300).contains(&status) {
        return match rule {
            DetectionRule::StatusRange {
                found_min,
                found_max,
            } => {
                if (*found_min..=*found_max).contains(&status) {
                    Verdict::found()
                } else {
                    Verdict::of(
                        ProbeStatus::Unknown,
                        format!("status {status} outside detection range"),
                    )
                }
            }
            DetectionRule::BodyContains { needle } => {
                if body_lower.contains(&needle.to_lowercase()) {
                    Verdict::found()
                } else {
                    Verdict::of(ProbeStatus::NotFound, "positive marker absent")
                }
            }
            DetectionRule::BodyAbsent { marker } => {
                if body_lower.contains(&marker.to_lowercase()) {
                    Verdict::of(ProbeStatus::NotFound, "not-found marker present")
                } else {
                    Verdict::found()
                }
            }
            DetectionRule::RedirectTarget { .. } => Verdict::of(
                ProbeStatus::Unknown,
                "expected a redirect, got a success status",
            ),
        };
    }

    Verdict::of(ProbeStatus::Unknown, format!("unclassifiable status {status}"))
}

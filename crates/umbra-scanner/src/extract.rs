use scraper::{Html, Selector};
use umbra_catalog::ExtractionRule;

/// Display metadata parsed opportunistically from a found profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Extract display metadata from a profile page using the platform's
/// extraction rule.
///
/// Selector resolution is attribute-aware: `content` (meta tags) and `src`
/// (images) are preferred over element text. Returns `None` when nothing
/// usable was found; absence of metadata never changes a classification.
pub fn extract_profile_details(html: &str, rule: &ExtractionRule) -> Option<ProfileDetails> {
    if rule.is_empty() {
        return None;
    }

    let document = Html::parse_document(html);

    let details = ProfileDetails {
        display_name: select_value(&document, rule.display_name.as_deref()),
        bio: select_value(&document, rule.bio.as_deref()),
        avatar: select_value(&document, rule.avatar.as_deref()),
    };

    if details == ProfileDetails::default() {
        None
    } else {
        Some(details)
    }
}

/// Resolve one selector against the document.
fn select_value(document: &Html, selector: Option<&str>) -> Option<String> {
    let selector = Selector::parse(selector?).ok()?;
    let element = document.select(&selector).next()?;

    let attr_value = element
        .value()
        .attr("content")
        .or_else(|| element.value().attr("src"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    attr_value.or_else(|| {
        let text = element.text().collect::<String>().trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}

use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DiscoveryMethod, Reference};
use url::Url;

/// Extracts `url(...)` arguments and `@import` targets from CSS text.
///
/// `source` must be the URL of the CSS itself: the stylesheet URL for linked
/// stylesheets, the page URL for inline styles.
pub fn extract(css: &str, source: &Url, rules: &ExtractionRules) -> Vec<Reference> {
    let mut references = Vec::new();

    for captures in rules.css_url().captures_iter(css) {
        let argument = captures
            .get(1)
            .or_else(|| captures.get(2))
            .or_else(|| captures.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if !argument.is_empty() {
            references.push(Reference::new(argument, source, DiscoveryMethod::Css));
        }
    }

    for captures in rules.css_import().captures_iter(css) {
        if let Some(target) = captures.get(1) {
            references.push(Reference::new(target.as_str(), source, DiscoveryMethod::Css));
        }
    }

    references
}

use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DiscoveryMethod, Reference};
use url::Url;

/// Runs the ordered text patterns over raw document text.
///
/// Reaches what the attribute scan cannot: inline script bodies, inline style
/// blocks, and string literals that embed a target extension. The same
/// candidate can match several patterns; one reference is yielded per match.
pub fn extract(text: &str, base: &Url, rules: &ExtractionRules) -> Vec<Reference> {
    let references: Vec<Reference> = rules
        .patterns()
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|captures| captures.get(1))
        .map(|m| Reference::new(m.as_str(), base, DiscoveryMethod::Pattern))
        .collect();

    ::log::trace!("Pattern scan found {} references in {}", references.len(), base);
    references
}

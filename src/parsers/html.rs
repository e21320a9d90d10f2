use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DiscoveryMethod, Reference, css};
use scraper::{ElementRef, Html};
use url::Url;

/// Scans every element of an HTML document for URL-bearing attributes.
///
/// Yields one reference per non-empty value of a table attribute, one per
/// candidate of a multi-value attribute, and one per `data-*` value that ends
/// in a target extension. Inline `style` attributes and `<style>` blocks go
/// through the CSS extractor with `base` as their source.
pub fn extract(html: &str, base: &Url, rules: &ExtractionRules) -> Vec<Reference> {
    let doc = Html::parse_document(html);
    let mut references = Vec::new();

    for element in doc.root_element().descendants().filter_map(ElementRef::wrap) {
        let tag = element.value().name();

        for (name, value) in element.value().attrs() {
            if let Some(rule) = rules.attribute_rule(tag, name) {
                if rule.multi {
                    references.extend(
                        split_candidates(value)
                            .map(|c| Reference::new(c, base, DiscoveryMethod::Attribute)),
                    );
                } else if !value.trim().is_empty() {
                    references.push(Reference::new(value, base, DiscoveryMethod::Attribute));
                }
            } else if name.starts_with("data-") && rules.has_target_extension(value) {
                references.push(Reference::new(value, base, DiscoveryMethod::Attribute));
            } else if name == "style" {
                references.extend(css::extract(value, base, rules));
            }
        }

        if tag == "style" {
            let block = element.text().collect::<String>();
            references.extend(css::extract(&block, base, rules));
        }
    }

    ::log::trace!("Attribute scan found {} references in {}", references.len(), base);
    references
}

/// Splits a `srcset`-style list into its URL candidates, dropping the width
/// and density descriptors
pub fn split_candidates(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
}

use regex::Regex;

/// An element attribute known to carry a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRule {
    pub tag: &'static str,
    pub attr: &'static str,
    /// Comma-separated candidate list (`srcset` style)
    pub multi: bool,
}

const fn rule(tag: &'static str, attr: &'static str) -> AttributeRule {
    AttributeRule {
        tag,
        attr,
        multi: false,
    }
}

const fn multi(tag: &'static str, attr: &'static str) -> AttributeRule {
    AttributeRule {
        tag,
        attr,
        multi: true,
    }
}

/// Element/attribute pairs scanned by the attribute extractor.
///
/// `href` on `image` and `use` also covers the `xlink:href` spelling, since
/// attributes are matched on their local name.
pub const ATTRIBUTE_RULES: &[AttributeRule] = &[
    rule("img", "src"),
    rule("img", "data-src"),
    rule("img", "data-original"),
    multi("img", "srcset"),
    multi("img", "data-srcset"),
    rule("source", "src"),
    multi("source", "srcset"),
    rule("link", "href"),
    rule("script", "src"),
    rule("video", "src"),
    rule("video", "poster"),
    rule("audio", "src"),
    rule("track", "src"),
    rule("embed", "src"),
    rule("object", "data"),
    rule("iframe", "src"),
    rule("frame", "src"),
    rule("input", "src"),
    rule("image", "href"),
    rule("use", "href"),
    rule("a", "href"),
    rule("area", "href"),
];

/// The fixed extraction table shared by every parser: attribute rules,
/// text patterns for the configured extensions, and the CSS patterns.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    attributes: &'static [AttributeRule],
    extensions: Vec<String>,
    patterns: Vec<Regex>,
    css_url: Regex,
    css_import: Regex,
}

impl ExtractionRules {
    /// Compile the rules for the given target extensions.
    ///
    /// An empty extension list disables the text-pattern scan.
    pub fn new(extensions: &[String]) -> Result<Self, regex::Error> {
        let extensions: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let patterns = if extensions.is_empty() {
            Vec::new()
        } else {
            let alternation = extensions
                .iter()
                .map(|ext| regex::escape(ext))
                .collect::<Vec<_>>()
                .join("|");
            vec![
                // quoted string literal ending in a target extension
                Regex::new(&format!(
                    r#"(?i)["']([^"'\s<>]*\.(?:{alternation})(?:\?[^"'\s<>#]*)?(?:#[^"'\s<>]*)?)["']"#
                ))?,
                // url(...) form
                Regex::new(&format!(
                    r#"(?i)url\(\s*["']?([^"'()\s]*\.(?:{alternation})(?:[?#][^"'()\s]*)?)["']?\s*\)"#
                ))?,
                // attribute assignment
                Regex::new(&format!(
                    r#"(?i)\b(?:href|src|data-src|xlink:href|poster|data)\s*=\s*["']([^"'\s]*\.(?:{alternation})(?:[?#][^"'\s]*)?)["']"#
                ))?,
            ]
        };

        Ok(Self {
            attributes: ATTRIBUTE_RULES,
            extensions,
            patterns,
            css_url: Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"'()\s]+))\s*\)"#)?,
            css_import: Regex::new(r#"(?i)@import\s+["']([^"']+)["']"#)?,
        })
    }

    /// Rule for `attr` on `tag`, matching namespaced attributes by local name
    pub fn attribute_rule(&self, tag: &str, attr: &str) -> Option<&AttributeRule> {
        let local = attr.rsplit(':').next().unwrap_or(attr);
        self.attributes
            .iter()
            .find(|rule| rule.tag.eq_ignore_ascii_case(tag) && rule.attr == local)
    }

    /// Ordered text patterns; capture group 1 holds the candidate
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Whether a raw value ends in one of the target extensions (query and fragment ignored)
    pub fn has_target_extension(&self, value: &str) -> bool {
        let path = value
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match path.rsplit_once('.') {
            Some((stem, ext)) => !stem.is_empty() && self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }

    pub fn css_url(&self) -> &Regex {
        &self.css_url
    }

    pub fn css_import(&self) -> &Regex {
        &self.css_import
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_pattern_extensions;

    #[test]
    fn test_attribute_rule_lookup() {
        let rules = ExtractionRules::new(&default_pattern_extensions()).unwrap();

        assert!(rules.attribute_rule("img", "src").is_some());
        assert!(rules.attribute_rule("img", "srcset").unwrap().multi);
        assert!(rules.attribute_rule("use", "xlink:href").is_some());
        assert!(rules.attribute_rule("div", "src").is_none());
        assert!(rules.attribute_rule("img", "alt").is_none());
    }

    #[test]
    fn test_target_extension_check() {
        let rules = ExtractionRules::new(&["svg".to_string(), ".PNG".to_string()]).unwrap();

        assert!(rules.has_target_extension("/icons/a.svg"));
        assert!(rules.has_target_extension("b.png?v=2#x"));
        assert!(rules.has_target_extension("C.SVG"));
        assert!(!rules.has_target_extension("a.svgz"));
        assert!(!rules.has_target_extension(".svg"));
        assert!(!rules.has_target_extension("true"));
    }

    #[test]
    fn test_empty_extension_list_disables_patterns() {
        let rules = ExtractionRules::new(&[]).unwrap();
        assert!(rules.patterns().is_empty());
        assert!(!rules.has_target_extension("a.svg"));
    }
}

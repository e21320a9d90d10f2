pub mod css;
pub mod html;
pub mod rules;
pub mod text;

#[cfg(test)]
mod tests;

use crate::filter::{PAGE_EXTENSIONS, extension};
use crate::normalize::{NormalizeError, normalize};
use rules::ExtractionRules;
use serde::Serialize;
use url::Url;

/// Which extractor produced a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMethod {
    /// Element attribute scan
    Attribute,
    /// Regex scan over raw text
    Pattern,
    /// `url(...)` / `@import` in CSS
    Css,
}

/// A candidate URL as found in a document, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The string exactly as it appeared
    pub raw: String,
    /// URL of the document it came from; relative candidates resolve against it
    pub source: Url,
    pub method: DiscoveryMethod,
}

impl Reference {
    pub fn new(raw: impl Into<String>, source: &Url, method: DiscoveryMethod) -> Self {
        Self {
            raw: raw.into(),
            source: source.clone(),
            method,
        }
    }

    /// Absolute, fragment-free form of this reference
    pub fn resolve(&self) -> Result<Url, NormalizeError> {
        normalize(&self.raw, &self.source)
    }
}

/// How a fetched document is scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Attribute, pattern and inline CSS scans
    Html,
    /// CSS scan only
    Css,
    /// Not scanned
    Other,
}

impl DocumentKind {
    /// Determine the document kind from the response content type, falling
    /// back to the URL when the server sends nothing useful
    pub fn detect(content_type: Option<&str>, url: &Url) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => DocumentKind::Html,
            "text/css" => DocumentKind::Css,
            "" | "text/plain" | "application/octet-stream" => Self::from_url(url),
            _ => DocumentKind::Other,
        }
    }

    /// Determine the document kind from the URL alone
    pub fn from_url(url: &Url) -> Self {
        match extension(url) {
            None => DocumentKind::Html,
            Some(ext) if PAGE_EXTENSIONS.contains(&ext.as_str()) => DocumentKind::Html,
            Some(ext) if ext == "css" => DocumentKind::Css,
            Some(_) => DocumentKind::Other,
        }
    }

    /// Returns if further page links can be found in this kind of document
    pub fn should_extract_links(&self) -> bool {
        matches!(self, DocumentKind::Html)
    }
}

/// Main parser that delegates to the specific extractors
pub struct Parser;

impl Parser {
    /// Collect every reference in `content` for the given document kind.
    ///
    /// HTML runs both the attribute scan and the text-pattern scan; their
    /// overlap is removed later by the collector.
    pub fn parse(
        content: &str,
        kind: DocumentKind,
        base: &Url,
        rules: &ExtractionRules,
    ) -> Vec<Reference> {
        let references = match kind {
            DocumentKind::Html => {
                let mut references = html::extract(content, base, rules);
                references.extend(text::extract(content, base, rules));
                references
            }
            DocumentKind::Css => css::extract(content, base, rules),
            DocumentKind::Other => Vec::new(),
        };

        ::log::debug!(
            "Parser found {} references in {} ({:?})",
            references.len(),
            base,
            kind
        );
        references
    }
}

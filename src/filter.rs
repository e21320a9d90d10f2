use crate::config::HarvestConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Extensions that mark a URL as a crawlable page rather than an asset
pub const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp"];

/// What a resolved URL is treated as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Crawlable page; fed back into the frontier
    Page,
    /// Asset to download once
    Asset,
}

/// Configuration for URL filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every in-scope URL must match exactly
    pub target_host: String,

    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Asset extensions to keep (if empty, every extension is kept)
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Asset extensions to drop (these take precedence over include extensions)
    #[serde(default)]
    pub exclude_extensions: Vec<String>,
}

impl UrlFilterConfig {
    /// A filter configuration that only restricts the host
    pub fn for_host(host: &str) -> Self {
        Self {
            target_host: host.to_string(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
        }
    }

    /// Build the filter configuration for a harvest run
    pub fn from_harvest(config: &HarvestConfig, host: &str) -> Self {
        Self {
            target_host: host.to_string(),
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            include_extensions: config.include_extensions.clone(),
            exclude_extensions: config.exclude_extensions.clone(),
        }
    }
}

/// URL filter that decides scope, classification and user-level inclusion
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
    include_extensions: Vec<String>,
    exclude_extensions: Vec<String>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut include_regexes = Vec::with_capacity(config.include_patterns.len());
        for pattern in &config.include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        let include_extensions = config
            .include_extensions
            .iter()
            .map(|ext| canonical_extension(ext))
            .collect();
        let exclude_extensions = config
            .exclude_extensions
            .iter()
            .map(|ext| canonical_extension(ext))
            .collect();

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
            include_extensions,
            exclude_extensions,
        })
    }

    /// Host the filter scopes to
    pub fn target_host(&self) -> &str {
        &self.config.target_host
    }

    /// True iff the URL is http(s) and its host equals the target host exactly
    pub fn is_in_scope(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str() == Some(self.config.target_host.as_str())
    }

    /// Determine if a page URL should be crawled
    pub fn should_crawl(&self, url: &Url) -> bool {
        self.is_in_scope(url) && self.passes_patterns(url)
    }

    /// Determine if an asset URL should be collected
    pub fn should_collect(&self, url: &Url) -> bool {
        if !self.should_crawl(url) {
            return false;
        }

        let ext = extension(url).unwrap_or_default();
        if self.exclude_extensions.contains(&ext) {
            return false;
        }
        self.include_extensions.is_empty() || self.include_extensions.contains(&ext)
    }

    /// Pages are URLs with no extension or a page extension; everything else is an asset.
    ///
    /// Extension-less asset routes (a generated image endpoint, say) land on the
    /// page side of this rule.
    pub fn classify(&self, url: &Url) -> LinkKind {
        match extension(url) {
            None => LinkKind::Page,
            Some(ext) if PAGE_EXTENSIONS.contains(&ext.as_str()) => LinkKind::Page,
            Some(_) => LinkKind::Asset,
        }
    }

    /// Check the user regexes; exclusions take precedence
    fn passes_patterns(&self, url: &Url) -> bool {
        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|regex| regex.is_match(url_str)) {
            ::log::debug!("URL filter excluded: {}", url_str);
            return false;
        }

        self.include_regexes.is_empty()
            || self.include_regexes.iter().any(|regex| regex.is_match(url_str))
    }
}

/// Lowercased extension of the URL's last path segment, if it has one
pub fn extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn canonical_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

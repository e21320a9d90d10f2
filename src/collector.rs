use crate::filter::{LinkKind, UrlFilter};
use crate::parsers::Reference;
use crate::utils::lock;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use url::Url;

/// Insertion-ordered set of normalized URLs, safe to share between workers
#[derive(Debug, Default)]
pub struct CollectedSet {
    inner: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    keys: HashSet<String>,
    order: Vec<Url>,
}

impl CollectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a URL; returns false if an equal key was already present
    pub fn insert(&self, url: Url) -> bool {
        let mut entries = lock(&self.inner);
        if !entries.keys.insert(url.as_str().to_string()) {
            return false;
        }
        entries.order.push(url);
        true
    }

    pub fn contains(&self, url: &Url) -> bool {
        lock(&self.inner).keys.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the URLs in insertion order
    pub fn urls(&self) -> Vec<Url> {
        lock(&self.inner).order.clone()
    }
}

/// Result of feeding one batch of references through the collector
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Collected {
    /// Assets that were not in the collected set before this batch
    pub new_assets: Vec<Url>,
    /// In-scope page links, deduplicated within the batch
    pub page_links: Vec<Url>,
}

/// Merges references from every extractor into the collected asset set
#[derive(Debug)]
pub struct Collector {
    filter: Arc<UrlFilter>,
    assets: CollectedSet,
}

impl Collector {
    pub fn new(filter: Arc<UrlFilter>) -> Self {
        Self {
            filter,
            assets: CollectedSet::new(),
        }
    }

    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    pub fn assets(&self) -> &CollectedSet {
        &self.assets
    }

    /// Normalize and scope-check a reference, then classify it.
    ///
    /// Returns `None` for unresolvable, out-of-scope and filtered-out candidates.
    pub fn admit(&self, reference: &Reference) -> Option<(LinkKind, Url)> {
        let url = match reference.resolve() {
            Ok(url) => url,
            Err(e) => {
                ::log::trace!("Dropping {:?} from {}: {}", reference.raw, reference.source, e);
                return None;
            }
        };

        match self.filter.classify(&url) {
            LinkKind::Page if self.filter.should_crawl(&url) => Some((LinkKind::Page, url)),
            LinkKind::Asset if self.filter.should_collect(&url) => Some((LinkKind::Asset, url)),
            _ => {
                ::log::trace!("URL filter rejected: {}", url);
                None
            }
        }
    }

    /// Feed a batch of references in any order and with any duplication
    pub fn collect<I>(&self, references: I) -> Collected
    where
        I: IntoIterator<Item = Reference>,
    {
        let mut collected = Collected::default();
        let mut seen_pages = HashSet::new();

        for reference in references {
            match self.admit(&reference) {
                Some((LinkKind::Asset, url)) => {
                    if self.assets.insert(url.clone()) {
                        ::log::debug!("Collected asset: {}", url);
                        collected.new_assets.push(url);
                    }
                }
                Some((LinkKind::Page, url)) => {
                    if seen_pages.insert(url.as_str().to_string()) {
                        collected.page_links.push(url);
                    }
                }
                None => {}
            }
        }

        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_pattern_extensions;
    use crate::filter::UrlFilterConfig;
    use crate::parsers::rules::ExtractionRules;
    use crate::parsers::{DiscoveryMethod, DocumentKind, Parser};

    fn collector(host: &str) -> Collector {
        let filter = UrlFilter::new(UrlFilterConfig::for_host(host)).unwrap();
        Collector::new(Arc::new(filter))
    }

    #[test]
    fn test_repeated_insert_is_a_no_op() {
        let set = CollectedSet::new();
        let url = Url::parse("https://site.example/a.svg").unwrap();

        assert!(set.insert(url.clone()));
        for _ in 0..10 {
            assert!(!set.insert(url.clone()));
        }
        assert_eq!(set.len(), 1);
        assert!(set.contains(&url));
    }

    #[test]
    fn test_other_hosts_are_dropped() {
        let collector = collector("site.example");
        let base = Url::parse("https://site.example/").unwrap();
        let collected = collector.collect(vec![
            Reference::new("https://other.example/x.svg", &base, DiscoveryMethod::Pattern),
            Reference::new("https://site.example/x.svg", &base, DiscoveryMethod::Pattern),
        ]);

        assert_eq!(collector.assets().len(), 1);
        assert_eq!(
            collected.new_assets[0].as_str(),
            "https://site.example/x.svg"
        );
    }

    #[test]
    fn test_fragments_collapse_to_one_entry() {
        let collector = collector("site.example");
        let base = Url::parse("https://site.example/").unwrap();
        collector.collect(vec![
            Reference::new("/sprite.svg#home", &base, DiscoveryMethod::Attribute),
            Reference::new("/sprite.svg#menu", &base, DiscoveryMethod::Attribute),
            Reference::new("sprite.svg", &base, DiscoveryMethod::Pattern),
        ]);
        assert_eq!(collector.assets().urls().len(), 1);
    }

    #[test]
    fn test_pages_and_assets_are_split() {
        let collector = collector("site.example");
        let base = Url::parse("https://site.example/docs/").unwrap();
        let collected = collector.collect(vec![
            Reference::new("intro", &base, DiscoveryMethod::Attribute),
            Reference::new("intro#part-2", &base, DiscoveryMethod::Attribute),
            Reference::new("setup.html", &base, DiscoveryMethod::Attribute),
            Reference::new("diagram.png", &base, DiscoveryMethod::Attribute),
            Reference::new("mailto:a@site.example", &base, DiscoveryMethod::Attribute),
        ]);

        let pages: Vec<&str> = collected.page_links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            pages,
            vec![
                "https://site.example/docs/intro",
                "https://site.example/docs/setup.html"
            ]
        );
        assert_eq!(collected.new_assets.len(), 1);
        assert!(!collector.assets().contains(&Url::parse("https://site.example/docs/intro").unwrap()));
    }

    #[test]
    fn test_second_batch_reports_only_new_assets() {
        let collector = collector("site.example");
        let base = Url::parse("https://site.example/").unwrap();
        let first = collector.collect(vec![Reference::new("a.png", &base, DiscoveryMethod::Css)]);
        let second = collector.collect(vec![
            Reference::new("a.png", &base, DiscoveryMethod::Css),
            Reference::new("b.png", &base, DiscoveryMethod::Css),
        ]);

        assert_eq!(first.new_assets.len(), 1);
        assert_eq!(second.new_assets.len(), 1);
        assert_eq!(second.new_assets[0].as_str(), "https://site.example/b.png");
    }

    #[test]
    fn test_three_independent_matches_yield_one_entry() {
        let collector = collector("site.example");
        let rules = ExtractionRules::new(&default_pattern_extensions()).unwrap();
        let base = Url::parse("https://site.example/").unwrap();
        let html = r#"
            <html><body>
              <img src="icon.svg">
              <div style="background:url('icon.svg')"></div>
              <script>var icon = "icon.svg";</script>
            </body></html>
        "#;

        let references = Parser::parse(html, DocumentKind::Html, &base, &rules);
        assert!(references.len() >= 3);
        collector.collect(references);

        assert_eq!(collector.assets().len(), 1);
        assert_eq!(
            collector.assets().urls()[0].as_str(),
            "https://site.example/icon.svg"
        );
    }

    #[test]
    fn test_concurrent_inserts_keep_one_entry() {
        let set = Arc::new(CollectedSet::new());
        let url = Url::parse("https://site.example/shared.svg").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                let url = url.clone();
                std::thread::spawn(move || set.insert(url))
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(set.len(), 1);
    }
}

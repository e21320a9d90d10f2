use crate::collector::Collector;
use crate::crawlers::fetcher::FetchMethod;
use crate::filter::UrlFilter;
use crate::results::{DownloadedRecord, FailureEntry, FailureStage, Report, ReportCounts};
use crate::utils::lock;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

/// Lifecycle of a page URL within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Pending,
    Visited,
    Failed,
}

#[derive(Debug, Default)]
struct PageBook {
    states: HashMap<String, PageState>,
    order: Vec<String>,
    frontier: VecDeque<Url>,
}

impl PageBook {
    fn set(&mut self, url: &Url, state: PageState) {
        if self.states.insert(url.as_str().to_string(), state).is_none() {
            self.order.push(url.as_str().to_string());
        }
    }

    fn with_state(&self, state: PageState) -> Vec<String> {
        self.order
            .iter()
            .filter(|key| self.states.get(*key) == Some(&state))
            .cloned()
            .collect()
    }
}

/// All state scoped to one harvest run.
///
/// Shared between workers behind an `Arc`; every collection has its own lock,
/// and no lock is held across an await point.
#[derive(Debug)]
pub struct Session {
    target: Url,
    started_at: DateTime<Utc>,
    collector: Collector,
    pages: Mutex<PageBook>,
    claimed_assets: Mutex<HashSet<String>>,
    downloaded: Mutex<Vec<DownloadedRecord>>,
    failures: Mutex<Vec<FailureEntry>>,
}

impl Session {
    pub fn new(target: Url, filter: Arc<UrlFilter>) -> Self {
        Self {
            target,
            started_at: Utc::now(),
            collector: Collector::new(filter),
            pages: Mutex::new(PageBook::default()),
            claimed_assets: Mutex::new(HashSet::new()),
            downloaded: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// The start URL of the run
    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Queue a page unless it is already pending, visited or failed
    pub fn enqueue_page(&self, url: Url) -> bool {
        let mut pages = lock(&self.pages);
        if pages.states.contains_key(url.as_str()) {
            ::log::trace!("Skipping already known page: {}", url);
            return false;
        }
        pages.set(&url, PageState::Pending);
        pages.frontier.push_back(url);
        true
    }

    /// Pop the next page to fetch, in discovery order
    pub fn next_page(&self) -> Option<Url> {
        lock(&self.pages).frontier.pop_front()
    }

    /// Whether pages are still waiting in the frontier
    pub fn has_queued_pages(&self) -> bool {
        !lock(&self.pages).frontier.is_empty()
    }

    /// Mark a page fetched; also used for the final URL after a redirect
    pub fn mark_visited(&self, url: &Url) {
        lock(&self.pages).set(url, PageState::Visited);
    }

    /// Mark a page failed and record why; failed pages are never retried
    pub fn mark_failed(&self, url: &Url, error: &str) {
        lock(&self.pages).set(url, PageState::Failed);
        self.record_failure(url, FailureStage::Page, error);
    }

    pub fn page_state(&self, url: &Url) -> Option<PageState> {
        lock(&self.pages).states.get(url.as_str()).copied()
    }

    /// Claim an asset for download; only the first caller per URL gets `true`
    pub fn claim_asset(&self, url: &Url) -> bool {
        lock(&self.claimed_assets).insert(url.as_str().to_string())
    }

    pub fn record_download(&self, record: DownloadedRecord) {
        lock(&self.downloaded).push(record);
    }

    pub fn record_failure(&self, url: &Url, stage: FailureStage, error: &str) {
        ::log::warn!("Failed {:?} {}: {}", stage, url, error);
        lock(&self.failures).push(FailureEntry {
            url: url.to_string(),
            stage,
            error: error.to_string(),
        });
    }

    pub fn downloaded(&self) -> Vec<DownloadedRecord> {
        lock(&self.downloaded).clone()
    }

    pub fn failures(&self) -> Vec<FailureEntry> {
        lock(&self.failures).clone()
    }

    /// Build the report from whatever the session holds right now
    pub fn report(&self, fetch_method: FetchMethod, interrupted: bool) -> Report {
        let (pages_visited, pages_failed, pages_pending) = {
            let pages = lock(&self.pages);
            (
                pages.with_state(PageState::Visited),
                pages.with_state(PageState::Failed),
                pages.with_state(PageState::Pending),
            )
        };
        let assets_found: Vec<String> = self
            .collector
            .assets()
            .urls()
            .iter()
            .map(|url| url.to_string())
            .collect();
        let downloaded = self.downloaded();
        let failures = self.failures();

        let counts = ReportCounts {
            pages_visited: pages_visited.len(),
            pages_failed: pages_failed.len(),
            pages_pending: pages_pending.len(),
            assets_found: assets_found.len(),
            assets_downloaded: downloaded.len(),
            errors: failures.len(),
            total_bytes: downloaded.iter().map(|record| record.bytes).sum(),
            by_extension: ReportCounts::tally_extensions(&downloaded),
        };

        Report {
            base_url: self.target.to_string(),
            fetch_method,
            started_at: self.started_at,
            finished_at: Utc::now(),
            interrupted,
            counts,
            pages_visited,
            pages_pending,
            assets_found,
            downloaded,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::UrlFilterConfig;

    fn session() -> Session {
        let filter = UrlFilter::new(UrlFilterConfig::for_host("site.example")).unwrap();
        Session::new(
            Url::parse("https://site.example/").unwrap(),
            Arc::new(filter),
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_pages_are_queued_once() {
        let session = session();
        assert!(session.enqueue_page(url("https://site.example/a")));
        assert!(!session.enqueue_page(url("https://site.example/a")));
        assert!(session.enqueue_page(url("https://site.example/b")));

        let first = session.next_page().unwrap();
        assert_eq!(first.as_str(), "https://site.example/a");
        session.mark_visited(&first);
        assert!(!session.enqueue_page(first.clone()));
        assert_eq!(session.page_state(&first), Some(PageState::Visited));

        let second = session.next_page().unwrap();
        session.mark_failed(&second, "HTTP status 500");
        assert!(!session.enqueue_page(second.clone()));
        assert_eq!(session.page_state(&second), Some(PageState::Failed));
        assert!(session.next_page().is_none());
    }

    #[test]
    fn test_assets_are_claimed_once() {
        let session = session();
        let asset = url("https://site.example/a.svg");
        assert!(session.claim_asset(&asset));
        assert!(!session.claim_asset(&asset));
    }

    #[test]
    fn test_report_counts() {
        let session = session();
        session.enqueue_page(url("https://site.example/"));
        session.enqueue_page(url("https://site.example/later"));
        let start = session.next_page().unwrap();
        session.mark_visited(&start);
        session.record_download(DownloadedRecord {
            url: "https://site.example/a.svg".to_string(),
            path: "out/a.svg".into(),
            bytes: 42,
            content_type: Some("image/svg+xml".to_string()),
            fetched_at: Utc::now(),
            svg: None,
        });
        session.record_download(DownloadedRecord {
            url: "https://site.example/b.SVG".to_string(),
            path: "out/b.SVG".into(),
            bytes: 8,
            content_type: None,
            fetched_at: Utc::now(),
            svg: None,
        });
        session.record_download(DownloadedRecord {
            url: "https://site.example/".to_string(),
            path: "out/assets/asset_1".into(),
            bytes: 1,
            content_type: None,
            fetched_at: Utc::now(),
            svg: None,
        });
        session.record_failure(&url("https://site.example/c.svg"), FailureStage::Asset, "HTTP status 404");

        let report = session.report(FetchMethod::Static, false);
        assert_eq!(report.counts.pages_visited, 1);
        assert_eq!(report.counts.pages_pending, 1);
        assert_eq!(report.pages_pending, vec!["https://site.example/later".to_string()]);
        assert_eq!(report.counts.assets_downloaded, 3);
        assert_eq!(report.counts.total_bytes, 51);
        let svg = &report.counts.by_extension["svg"];
        assert_eq!((svg.files, svg.bytes), (2, 50));
        assert_eq!(report.counts.by_extension["none"].files, 1);
        assert_eq!(report.counts.by_extension.len(), 2);
        assert_eq!(report.counts.errors, 1);
        assert!(!report.interrupted);
    }
}

use crate::crawlers::fetcher::{FetchedPage, PageFetcher};
use crate::crawlers::http::HttpFetcher;
use crate::error::{FetchError, HarvestError};
use crate::filter::extension;
use crate::layout::{OutputLayout, write_file};
use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DocumentKind, Parser};
use crate::results::FailureStage;
use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Everything a crawl or download worker needs; cheap to clone
#[derive(Clone)]
pub struct CrawlContext {
    pub session: Arc<Session>,
    pub pages: Arc<dyn PageFetcher>,
    pub assets: Arc<HttpFetcher>,
    pub rules: Arc<ExtractionRules>,
    pub layout: Arc<OutputLayout>,
    pub max_concurrency: usize,
    pub max_pages: usize,
    pub delay: Duration,
    pub save_pages: bool,
}

/// Crawl every in-scope page reachable from the session's start URL.
///
/// The start page is fetched on its own first; if that fails the whole run
/// fails. After that, at most `max_concurrency` pages are in flight and at
/// most `max_pages` pages are fetched in total.
pub async fn crawl(ctx: &CrawlContext) -> Result<(), HarvestError> {
    let start = ctx.session.target().clone();
    ::log::info!(
        "Starting crawl of {} within {} ({:?} fetches, {} workers)",
        start,
        ctx.session.collector().filter().target_host(),
        ctx.pages.method(),
        ctx.max_concurrency
    );

    ctx.session.enqueue_page(start.clone());
    let start = ctx.session.next_page().unwrap_or(start);
    if let Err(source) = visit_page(ctx, &start).await {
        ctx.session.mark_failed(&start, &source.to_string());
        return Err(HarvestError::Unreachable {
            url: start.to_string(),
            source,
        });
    }

    let mut dispatched = 1;
    let mut workers = JoinSet::new();
    let concurrency = ctx.max_concurrency.max(1);

    loop {
        while workers.len() < concurrency && dispatched < ctx.max_pages {
            let Some(url) = ctx.session.next_page() else {
                break;
            };
            dispatched += 1;
            ::log::debug!("Dispatching page {} of at most {}: {}", dispatched, ctx.max_pages, url);

            let ctx = ctx.clone();
            workers.spawn(async move {
                if let Err(e) = visit_page(&ctx, &url).await {
                    ctx.session.mark_failed(&url, &e.to_string());
                }
            });
        }

        match workers.join_next().await {
            Some(Ok(())) => {}
            Some(Err(e)) => ::log::error!("Crawl worker ended abnormally: {}", e),
            None => break,
        }
    }

    if ctx.session.has_queued_pages() {
        ::log::info!(
            "Page limit of {} reached; remaining pages left pending",
            ctx.max_pages
        );
    }
    ::log::info!("Crawl finished after {} pages", dispatched);
    Ok(())
}

/// Fetch one page, then sleep the per-request delay and process the body
async fn visit_page(ctx: &CrawlContext, url: &Url) -> Result<(), FetchError> {
    let fetched = ctx.pages.fetch_page(url).await;
    if !ctx.delay.is_zero() {
        tokio::time::sleep(ctx.delay).await;
    }
    let page = fetched?;
    process_page(ctx, url, page).await;
    Ok(())
}

async fn process_page(ctx: &CrawlContext, url: &Url, page: FetchedPage) {
    let session = &ctx.session;
    session.mark_visited(url);

    let mut base = page.final_url;
    base.set_fragment(None);
    if base != *url && session.collector().filter().is_in_scope(&base) {
        session.mark_visited(&base);
    }

    let kind = DocumentKind::detect(page.content_type.as_deref(), &base);
    if extension(url).is_none() && kind != DocumentKind::Html {
        ::log::warn!(
            "{} has no extension but was served as {}; likely an asset, not a page",
            url,
            page.content_type.as_deref().unwrap_or("unknown content")
        );
    }

    if ctx.save_pages && kind == DocumentKind::Html {
        let path = ctx.layout.page_path(url);
        match write_file(&path, page.body.as_bytes()).await {
            Ok(()) => ::log::debug!("Saved page {} to {}", url, path.display()),
            Err(e) => session.record_failure(url, FailureStage::Save, &e.to_string()),
        }
    }

    let references = Parser::parse(&page.body, kind, &base, &ctx.rules);
    let collected = session.collector().collect(references);

    let mut queued = 0;
    if kind.should_extract_links() {
        for link in collected.page_links {
            if session.enqueue_page(link) {
                queued += 1;
            }
        }
    }

    ::log::info!(
        "Crawled {}: {} new assets, {} new pages queued",
        url,
        collected.new_assets.len(),
        queued
    );
}

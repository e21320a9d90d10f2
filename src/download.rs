use crate::crawlers::web::CrawlContext;
use crate::filter::extension;
use crate::layout::write_file;
use crate::parsers::{DocumentKind, Parser};
use crate::results::{DownloadedRecord, FailureStage, SvgSummary};
use chrono::Utc;
use std::collections::VecDeque;
use tokio::task::JoinSet;
use url::Url;

/// Download every collected asset once.
///
/// Stylesheets are scanned after download; assets they reference that were
/// not collected yet join the same queue.
pub async fn download_assets(ctx: &CrawlContext) {
    let mut queue: VecDeque<Url> = ctx.session.collector().assets().urls().into();
    ::log::info!("Downloading {} collected assets", queue.len());

    let mut workers = JoinSet::new();
    let concurrency = ctx.max_concurrency.max(1);

    loop {
        while workers.len() < concurrency {
            let Some(url) = queue.pop_front() else {
                break;
            };
            if !ctx.session.claim_asset(&url) {
                continue;
            }
            let ctx = ctx.clone();
            workers.spawn(async move { download_asset(&ctx, url).await });
        }

        match workers.join_next().await {
            Some(Ok(discovered)) => queue.extend(discovered),
            Some(Err(e)) => ::log::error!("Download worker ended abnormally: {}", e),
            None => break,
        }
    }
}

/// Fetch, save and record one asset; returns assets newly found inside it
async fn download_asset(ctx: &CrawlContext, url: Url) -> Vec<Url> {
    let session = &ctx.session;
    let fetched = ctx.assets.fetch_asset(&url).await;
    if !ctx.delay.is_zero() {
        tokio::time::sleep(ctx.delay).await;
    }

    let asset = match fetched {
        Ok(asset) => asset,
        Err(e) => {
            session.record_failure(&url, FailureStage::Asset, &e.to_string());
            return Vec::new();
        }
    };
    let content_type = asset.content_type.as_deref();

    let path = ctx.layout.asset_path(&url, content_type);
    if let Err(e) = write_file(&path, &asset.bytes).await {
        session.record_failure(&url, FailureStage::Save, &e.to_string());
        return Vec::new();
    }

    let is_svg = extension(&url).as_deref() == Some("svg")
        || content_type.is_some_and(|ct| ct.contains("svg"));
    let svg = is_svg.then(|| SvgSummary::from_markup(&String::from_utf8_lossy(&asset.bytes)));

    ::log::info!("Downloaded {} -> {} ({} bytes)", url, path.display(), asset.bytes.len());
    session.record_download(DownloadedRecord {
        url: url.to_string(),
        path,
        bytes: asset.bytes.len() as u64,
        content_type: asset.content_type.clone(),
        fetched_at: Utc::now(),
        svg,
    });

    if DocumentKind::detect(content_type, &url) != DocumentKind::Css {
        return Vec::new();
    }

    // references inside a stylesheet resolve against the stylesheet itself
    let css = String::from_utf8_lossy(&asset.bytes);
    let references = Parser::parse(&css, DocumentKind::Css, &url, &ctx.rules);
    let collected = session.collector().collect(references);
    if !collected.new_assets.is_empty() {
        ::log::debug!(
            "Stylesheet {} referenced {} new assets",
            url,
            collected.new_assets.len()
        );
    }
    collected.new_assets
}

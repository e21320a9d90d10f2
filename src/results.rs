use crate::crawlers::fetcher::FetchMethod;
use crate::error::HarvestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Element counts of a downloaded SVG file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgSummary {
    pub symbols: usize,
    pub paths: usize,
    pub groups: usize,
    pub circles: usize,
    pub rects: usize,
}

impl SvgSummary {
    /// Count element openings in SVG markup, case-insensitively
    pub fn from_markup(markup: &str) -> Self {
        let lowered = markup.to_ascii_lowercase();
        Self {
            symbols: count_tag(&lowered, "symbol"),
            paths: count_tag(&lowered, "path"),
            groups: count_tag(&lowered, "g"),
            circles: count_tag(&lowered, "circle"),
            rects: count_tag(&lowered, "rect"),
        }
    }
}

fn count_tag(markup: &str, tag: &str) -> usize {
    let opening = format!("<{}", tag);
    markup
        .match_indices(&opening)
        .filter(|(index, _)| {
            markup[index + opening.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
        })
        .count()
}

/// One successfully fetched asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedRecord {
    /// Absolute URL of the asset
    pub url: String,

    /// Where the bytes were written
    pub path: PathBuf,

    /// Size of the body in bytes
    pub bytes: u64,

    /// Content type as reported by the server
    pub content_type: Option<String>,

    pub fetched_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<SvgSummary>,
}

/// Stage at which an item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Page,
    Asset,
    Save,
}

/// A per-item failure; recorded, never fatal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEntry {
    pub url: String,
    pub stage: FailureStage,
    pub error: String,
}

/// Downloaded files and bytes sharing one extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCount {
    pub files: usize,
    pub bytes: u64,
}

/// Summary counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub pages_pending: usize,
    pub assets_found: usize,
    pub assets_downloaded: usize,
    pub errors: usize,
    pub total_bytes: u64,
    /// Downloads keyed by lowercased file extension (`none` when missing)
    #[serde(default)]
    pub by_extension: BTreeMap<String, ExtensionCount>,
}

impl ReportCounts {
    /// Tally downloads per saved file extension
    pub fn tally_extensions(records: &[DownloadedRecord]) -> BTreeMap<String, ExtensionCount> {
        let mut by_extension: BTreeMap<String, ExtensionCount> = BTreeMap::new();
        for record in records {
            let ext = record
                .path
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_else(|| "none".to_string());
            let entry = by_extension.entry(ext).or_default();
            entry.files += 1;
            entry.bytes += record.bytes;
        }
        by_extension
    }
}

/// The structured summary written once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub base_url: String,
    pub fetch_method: FetchMethod,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the run was stopped by the user before finishing
    pub interrupted: bool,
    pub counts: ReportCounts,
    pub pages_visited: Vec<String>,
    pub pages_pending: Vec<String>,
    pub assets_found: Vec<String>,
    pub downloaded: Vec<DownloadedRecord>,
    pub failures: Vec<FailureEntry>,
}

impl Report {
    /// Write the report as pretty JSON
    pub async fn write(&self, path: &Path) -> Result<(), HarvestError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| HarvestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        ::log::info!("Report saved: {}", path.display());
        Ok(())
    }

    /// Log the headline numbers of the run
    pub fn log_summary(&self) {
        ::log::info!(
            "Harvest of {} finished{} using {:?} fetches",
            self.base_url,
            if self.interrupted { " (interrupted)" } else { "" },
            self.fetch_method
        );
        ::log::info!(
            "Pages visited: {}, failed: {}, pending: {}",
            self.counts.pages_visited,
            self.counts.pages_failed,
            self.counts.pages_pending
        );
        ::log::info!(
            "Assets found: {}, downloaded: {} ({} bytes), errors: {}",
            self.counts.assets_found,
            self.counts.assets_downloaded,
            self.counts.total_bytes,
            self.counts.errors
        );
        for (ext, count) in &self.counts.by_extension {
            ::log::info!("  .{}: {} files, {} bytes", ext, count.files, count.bytes);
        }
        for failure in self.failures.iter().take(10) {
            ::log::info!("  failed {:?} {}: {}", failure.stage, failure.url, failure.error);
        }
        if self.failures.len() > 10 {
            ::log::info!("  ... and {} more", self.failures.len() - 10);
        }
    }
}

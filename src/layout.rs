use crate::error::FetchError;
use crate::utils::{extension_for_content_type, lock, sanitize_segment};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Maps URLs to files under the output directory, mirroring the URL path.
///
/// Every path handed out is unique within the run: when two URLs map to the
/// same file (differing only in query string, say) the later one gets a
/// numeric suffix.
#[derive(Debug)]
pub struct OutputLayout {
    root: PathBuf,
    claimed: Mutex<HashSet<PathBuf>>,
    generated: AtomicUsize,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            claimed: Mutex::new(HashSet::new()),
            generated: AtomicUsize::new(0),
        }
    }

    /// Keep `path` out of the mirrored tree; a URL mapping onto it gets a suffix
    pub fn reserve(&self, path: impl Into<PathBuf>) {
        lock(&self.claimed).insert(path.into());
    }

    /// Path for a page; directories become `index.html` and bare names get `.html`
    pub fn page_path(&self, url: &Url) -> PathBuf {
        let mut segments = decoded_segments(url);
        match segments.last_mut() {
            Some(last) if last.is_empty() => *last = "index.html".to_string(),
            Some(last) if !has_extension(last) => last.push_str(".html"),
            Some(_) => {}
            None => segments.push("index.html".to_string()),
        }
        self.claim(self.root.join(segments.iter().collect::<PathBuf>()))
    }

    /// Path for an asset; a missing file name falls back to a generated one
    pub fn asset_path(&self, url: &Url, content_type: Option<&str>) -> PathBuf {
        let guessed = content_type.and_then(extension_for_content_type);
        let mut segments = decoded_segments(url);

        match segments.last_mut() {
            Some(last) if !last.is_empty() => {
                if !has_extension(last) {
                    if let Some(ext) = guessed {
                        last.push_str(ext);
                    }
                }
            }
            _ => {
                let n = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
                segments = vec![
                    "assets".to_string(),
                    format!("asset_{}{}", n, guessed.unwrap_or_default()),
                ];
            }
        }
        self.claim(self.root.join(segments.iter().collect::<PathBuf>()))
    }

    /// Reserve `candidate`, or the first free `stem_N.ext` variant of it
    fn claim(&self, candidate: PathBuf) -> PathBuf {
        let mut claimed = lock(&self.claimed);
        if claimed.insert(candidate.clone()) {
            return candidate;
        }

        let stem = candidate
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = candidate
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut counter = 1;
        loop {
            let alternative = candidate.with_file_name(format!("{}_{}{}", stem, counter, ext));
            if claimed.insert(alternative.clone()) {
                ::log::debug!(
                    "Path {} already used, saving as {}",
                    candidate.display(),
                    alternative.display()
                );
                return alternative;
            }
            counter += 1;
        }
    }
}

/// Write bytes to `path`, creating parent directories as needed
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| FetchError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| FetchError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Percent-decoded, sanitized path segments. Empty interior segments are
/// dropped; an empty last segment (trailing slash) is kept.
fn decoded_segments(url: &Url) -> Vec<String> {
    let Some(segments) = url.path_segments() else {
        return Vec::new();
    };
    let raw: Vec<&str> = segments.collect();
    let count = raw.len();

    raw.into_iter()
        .enumerate()
        .filter(|(i, segment)| !segment.is_empty() || i + 1 == count)
        .map(|(_, segment)| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            if decoded.is_empty() {
                decoded
            } else {
                sanitize_segment(&decoded)
            }
        })
        .collect()
}

fn has_extension(name: &str) -> bool {
    Path::new(name).extension().is_some()
}

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the data if a worker panicked while holding it
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Convert a URL path segment to a sanitized file name component
pub fn sanitize_segment(segment: &str) -> String {
    let mut name: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // keep "." and ".." from escaping the output directory
    if name.chars().all(|c| c == '.') {
        name = name.replace('.', "_");
    }

    // Limit file name length
    if name.chars().count() > 100 {
        name = name.chars().take(100).collect();
    }
    name
}

/// Guess a file extension (with the leading dot) from a content type
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    let ext = match mime.to_ascii_lowercase().as_str() {
        "text/html" | "application/xhtml+xml" => ".html",
        "text/css" => ".css",
        "application/javascript" | "text/javascript" | "application/x-javascript" => ".js",
        "application/json" => ".json",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/avif" => ".avif",
        "image/bmp" => ".bmp",
        "image/svg+xml" => ".svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "font/woff" | "application/font-woff" => ".woff",
        "font/woff2" => ".woff2",
        "font/ttf" | "application/x-font-ttf" => ".ttf",
        "font/otf" => ".otf",
        "application/vnd.ms-fontobject" => ".eot",
        "application/pdf" => ".pdf",
        _ => return None,
    };
    Some(ext)
}

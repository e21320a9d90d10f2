use thiserror::Error;
use url::Url;

/// Why a candidate reference was dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("empty or fragment-only reference")]
    Empty,

    #[error("unsupported scheme: {0}")]
    Unsupported(String),

    #[error("unresolvable reference: {0}")]
    Unresolvable(String),
}

/// Prefixes that never point at a fetchable resource
const SKIPPED_PREFIXES: &[&str] = &["data:", "javascript:", "mailto:", "tel:", "blob:", "about:"];

/// Undo the escaping a candidate picks up when it is lifted from raw markup or script text
pub fn clean_candidate(raw: &str) -> String {
    let mut cleaned = raw.trim().replace("\\/", "/");
    // markup escaped more than once (`&amp;amp;`) decodes all the way down
    while cleaned.contains("&amp;") {
        cleaned = cleaned.replace("&amp;", "&");
    }
    cleaned
}

/// Resolve `raw` against `base` and strip the fragment.
///
/// Handles `./`, `../`, protocol-relative `//host/path` and query strings via
/// [`Url::join`]. The result is always an absolute http(s) URL, and feeding it
/// back in yields the same URL.
pub fn normalize(raw: &str, base: &Url) -> Result<Url, NormalizeError> {
    let candidate = clean_candidate(raw);
    if candidate.is_empty() || candidate.starts_with('#') {
        return Err(NormalizeError::Empty);
    }

    let lowered = candidate.to_ascii_lowercase();
    if let Some(prefix) = SKIPPED_PREFIXES.iter().find(|p| lowered.starts_with(*p)) {
        return Err(NormalizeError::Unsupported(
            prefix.trim_end_matches(':').to_string(),
        ));
    }

    let mut url = base
        .join(&candidate)
        .map_err(|e| NormalizeError::Unresolvable(format!("{}: {}", candidate, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(NormalizeError::Unsupported(other.to_string())),
    }

    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.example/docs/guide/index.html").unwrap()
    }

    #[test]
    fn test_strips_only_the_fragment() {
        let url = normalize("https://s/p.svg#frag", &base()).unwrap();
        assert_eq!(url.as_str(), "https://s/p.svg");

        let url = normalize("icons.svg?v=3#logo", &base()).unwrap();
        assert_eq!(url.as_str(), "https://site.example/docs/guide/icons.svg?v=3");
    }

    #[test]
    fn test_is_idempotent() {
        let inputs = [
            "../img/a.png",
            "./b.css?x=1&y=2",
            "//site.example/c.js",
            "/d.svg#sprite",
            "e%20f.png",
        ];
        for input in inputs {
            let once = normalize(input, &base()).unwrap();
            let twice = normalize(once.as_str(), &base()).unwrap();
            assert_eq!(once, twice, "normalizing {} twice changed it", input);

            let elsewhere = Url::parse("https://elsewhere.example/x/y").unwrap();
            assert_eq!(normalize(once.as_str(), &elsewhere).unwrap(), once);
        }
    }

    #[test]
    fn test_relative_forms() {
        let cases = [
            ("./a.png", "https://site.example/docs/guide/a.png"),
            ("../a.png", "https://site.example/docs/a.png"),
            ("../../../a.png", "https://site.example/a.png"),
            ("/root.css", "https://site.example/root.css"),
            ("//cdn.example/lib.js", "https://cdn.example/lib.js"),
            ("?page=2", "https://site.example/docs/guide/index.html?page=2"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize(input, &base()).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_unescapes_markup_and_script_forms() {
        let url = normalize("/a.png?x=1&amp;y=2", &base()).unwrap();
        assert_eq!(url.as_str(), "https://site.example/a.png?x=1&y=2");

        let nested = normalize("/a.png?x=1&amp;amp;y=2", &base()).unwrap();
        assert_eq!(nested.as_str(), "https://site.example/a.png?x=1&y=2");
        assert_eq!(normalize(nested.as_str(), &base()).unwrap(), nested);

        let url = normalize("\\/assets\\/icon.svg", &base()).unwrap();
        assert_eq!(url.as_str(), "https://site.example/assets/icon.svg");
    }

    #[test]
    fn test_drops_non_fetchable_candidates() {
        assert_eq!(normalize("   ", &base()), Err(NormalizeError::Empty));
        assert_eq!(normalize("#top", &base()), Err(NormalizeError::Empty));
        assert_eq!(
            normalize("data:image/png;base64,AAAA", &base()),
            Err(NormalizeError::Unsupported("data".to_string()))
        );
        assert_eq!(
            normalize("JavaScript:void(0)", &base()),
            Err(NormalizeError::Unsupported("javascript".to_string()))
        );
        assert_eq!(
            normalize("ftp://site.example/file.svg", &base()),
            Err(NormalizeError::Unsupported("ftp".to_string()))
        );
        assert!(matches!(
            normalize("http://[::1", &base()),
            Err(NormalizeError::Unresolvable(_))
        ));
    }
}

use crate::config::default_pattern_extensions;
use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DiscoveryMethod, DocumentKind, Parser};
use url::Url;

fn rules() -> ExtractionRules {
    ExtractionRules::new(&default_pattern_extensions()).unwrap()
}

#[test]
fn test_html_runs_every_extractor() {
    let base = Url::parse("https://site.example/").unwrap();
    let html = r#"
        <html><body>
          <img src="icon.svg">
          <div style="background:url('icon.svg')"></div>
          <script>const i = "icon.svg";</script>
        </body></html>
    "#;
    let references = Parser::parse(html, DocumentKind::Html, &base, &rules());

    for method in [
        DiscoveryMethod::Attribute,
        DiscoveryMethod::Pattern,
        DiscoveryMethod::Css,
    ] {
        assert!(
            references.iter().any(|r| r.method == method),
            "no reference from {:?}",
            method
        );
    }
    assert!(
        references
            .iter()
            .all(|r| r.resolve().unwrap().as_str() == "https://site.example/icon.svg")
    );
}

#[test]
fn test_css_and_other_documents() {
    let base = Url::parse("https://site.example/a.css").unwrap();
    let css = Parser::parse("b{background:url(b.png)}", DocumentKind::Css, &base, &rules());
    assert_eq!(css.len(), 1);
    assert_eq!(css[0].method, DiscoveryMethod::Css);

    let other = Parser::parse("\"c.png\"", DocumentKind::Other, &base, &rules());
    assert!(other.is_empty());
}

#[test]
fn test_document_kind_detection() {
    let page = Url::parse("https://site.example/about").unwrap();
    let css = Url::parse("https://site.example/app.css").unwrap();
    let image = Url::parse("https://site.example/route").unwrap();

    assert_eq!(
        DocumentKind::detect(Some("text/html; charset=utf-8"), &page),
        DocumentKind::Html
    );
    assert_eq!(DocumentKind::detect(Some("TEXT/CSS"), &page), DocumentKind::Css);
    assert_eq!(DocumentKind::detect(None, &css), DocumentKind::Css);
    assert_eq!(DocumentKind::detect(Some("text/plain"), &page), DocumentKind::Html);
    assert_eq!(DocumentKind::detect(Some("image/png"), &image), DocumentKind::Other);
    assert!(DocumentKind::Html.should_extract_links());
    assert!(!DocumentKind::Css.should_extract_links());
}

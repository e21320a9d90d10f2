use crate::config::default_pattern_extensions;
use crate::parsers::rules::ExtractionRules;
use crate::parsers::{DiscoveryMethod, text};
use url::Url;

fn base() -> Url {
    Url::parse("https://site.example/").unwrap()
}

fn found(text: &str, rules: &ExtractionRules) -> Vec<String> {
    text::extract(text, &base(), rules)
        .into_iter()
        .map(|r| {
            assert_eq!(r.method, DiscoveryMethod::Pattern);
            r.raw
        })
        .collect()
}

#[test]
fn test_script_string_literals() {
    let rules = ExtractionRules::new(&default_pattern_extensions()).unwrap();
    let script = r#"
        const icons = ["icons/home.svg", 'icons/user.SVG?v=2'];
        loadSprite("/assets/sprite.svg#all");
        const config = {"data": "settings.json", "lib": "vendor/lib.js"};
    "#;
    let matches = found(script, &rules);

    assert!(matches.contains(&"icons/home.svg".to_string()));
    assert!(matches.contains(&"icons/user.SVG?v=2".to_string()));
    assert!(matches.contains(&"/assets/sprite.svg#all".to_string()));
    assert!(matches.contains(&"vendor/lib.js".to_string()));
    assert!(!matches.iter().any(|m| m.contains("settings.json")));
}

#[test]
fn test_url_form_without_quotes() {
    let rules = ExtractionRules::new(&["svg".to_string()]).unwrap();
    let matches = found("div{background:url( img/bg.svg )}", &rules);
    assert_eq!(matches, vec!["img/bg.svg".to_string()]);
}

#[test]
fn test_same_candidate_matches_several_patterns() {
    let rules = ExtractionRules::new(&["svg".to_string()]).unwrap();
    let matches = found(r#"<img src="icon.svg">"#, &rules);

    // quoted-literal pattern and attribute-assignment pattern both fire
    assert_eq!(matches, vec!["icon.svg".to_string(), "icon.svg".to_string()]);
}

#[test]
fn test_extension_must_end_the_path() {
    let rules = ExtractionRules::new(&["js".to_string(), "woff".to_string()]).unwrap();
    let matches = found(
        r#"'a.json' "b.jsx" "c.js.map" 'font.woff2' 'font.woff'"#,
        &rules,
    );
    assert_eq!(matches, vec!["font.woff".to_string()]);
}

#[test]
fn test_whitespace_breaks_a_candidate() {
    let rules = ExtractionRules::new(&["png".to_string()]).unwrap();
    let matches = found(r#"alt="a picture of x.png""#, &rules);
    assert!(matches.is_empty());
}

#[test]
fn test_no_patterns_without_extensions() {
    let rules = ExtractionRules::new(&[]).unwrap();
    assert!(found(r#""icon.svg""#, &rules).is_empty());
}

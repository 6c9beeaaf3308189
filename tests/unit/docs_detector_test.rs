//! Unit tests for documentation-page detection: URL tiers and the page-structure tier.

use rstest::rstest;

use docsfocus::services::docs_detector::{DocsDetector, DocsDetectorTrait};
use docsfocus::services::html_snapshot::{DomContext, HtmlSnapshot};
use docsfocus::types::detection::DetectionReason;

fn detector() -> DocsDetector {
    DocsDetector::new()
}

// ─── URL tiers ───

#[rstest]
#[case("https://docs.python.org/3/library/asyncio.html", DetectionReason::Pattern)]
#[case("https://developer.mozilla.org/en-US/docs/Web", DetectionReason::Pattern)]
#[case("https://www.npmjs.com/package/left-pad", DetectionReason::Pattern)]
#[case("https://example.com/docs/intro", DetectionReason::Pattern)]
#[case("https://api.example.com/v1", DetectionReason::Pattern)]
#[case("https://developer.example.com/", DetectionReason::HostKeyword)]
#[case("https://reference.example.org/", DetectionReason::HostKeyword)]
#[case("https://example.com/guide/intro", DetectionReason::PathKeyword)]
#[case("https://example.com/a/Handbook", DetectionReason::PathKeyword)]
fn test_url_tiers(#[case] url: &str, #[case] reason: DetectionReason) {
    let result = detector().analyze(url, None);
    assert!(result.matched, "{url} should be detected");
    assert_eq!(result.reason, reason);
    assert!(!result.signals.is_empty());
}

#[rstest]
#[case("https://example.com/")]
#[case("https://news.example.com/story/123")]
#[case("https://example.com/guides/intro")]
#[case("https://mydocs.example.com/")]
fn test_plain_pages_are_not_docs(#[case] url: &str) {
    let result = detector().analyze(url, None);
    assert!(!result.matched);
    assert_eq!(result.reason, DetectionReason::None);
    assert!(result.signals.is_empty());
}

#[rstest]
#[case("not a url")]
#[case("")]
#[case("://missing-scheme")]
fn test_invalid_urls_are_false(#[case] url: &str) {
    assert!(!detector().is_documentation(url, None));
}

#[test]
fn test_pattern_tier_wins_over_host_tier() {
    let result = detector().analyze("https://docs.github.com/en", None);
    assert_eq!(result.reason, DetectionReason::Pattern);
}

#[test]
fn test_host_signal_names_the_label() {
    let result = detector().analyze("https://developer.example.com/", None);
    assert_eq!(result.signals, vec!["host:developer"]);
}

#[test]
fn test_describe_carries_label() {
    let described = detector().describe("https://example.com/guide/intro", None);
    assert!(described.matched);
    assert_eq!(described.label, "URL path suggests documentation.");

    let negative = detector().describe("https://example.com/", None);
    assert!(!negative.matched);
    assert_eq!(negative.label, "No documentation signals detected.");
}

// ─── Page structure ───

const DOC_PAGE: &str = r#"<!doctype html>
<html><head><title>x</title><script>var s = "<article>";</script></head>
<body>
  <nav aria-label="breadcrumb"><a href="/">Home</a></nav>
  <main><h1>Getting <em>Started</em></h1><p>Install the thing.</p></main>
</body></html>"#;

#[test]
fn test_structure_and_heading_detect_docs() {
    let snapshot = HtmlSnapshot::parse(DOC_PAGE);
    let result = detector().analyze("https://example.com/", Some(&snapshot));
    assert!(result.matched);
    assert_eq!(result.reason, DetectionReason::DomStructure);
    assert_eq!(result.signals[0], "selector:main");
    assert_eq!(result.signals[1], "heading:Getting Started");
}

#[test]
fn test_structure_without_heading_still_matches() {
    let snapshot = HtmlSnapshot::parse(r#"<div class="sidebar nav"></div><p>hi</p>"#);
    let result = detector().analyze("https://example.com/", Some(&snapshot));
    assert!(result.matched);
    assert_eq!(result.signals, vec!["selector:.sidebar", "heading:none"]);
}

#[test]
fn test_structure_with_unrelated_heading_is_rejected() {
    let snapshot = HtmlSnapshot::parse("<article><h1>Ten cats you must see</h1></article>");
    assert!(!detector().is_documentation("https://example.com/", Some(&snapshot)));
}

#[test]
fn test_heading_without_structure_is_rejected() {
    let snapshot = HtmlSnapshot::parse("<div><h1>API Reference</h1></div>");
    assert!(!detector().is_documentation("https://example.com/", Some(&snapshot)));
}

#[test]
fn test_url_tiers_run_before_structure() {
    let snapshot = HtmlSnapshot::parse("<article><h1>Cats</h1></article>");
    let result = detector().analyze("https://example.com/docs/x", Some(&snapshot));
    assert_eq!(result.reason, DetectionReason::Pattern);
}

// ─── HtmlSnapshot ───

#[rstest]
#[case("article", false)]
#[case("main", true)]
#[case(r#"[role="main"]"#, false)]
#[case(r#"nav[aria-label="breadcrumb"]"#, true)]
#[case(r#"nav[aria-label="primary"]"#, false)]
#[case(".breadcrumb", false)]
fn test_snapshot_selectors(#[case] selector: &str, #[case] expected: bool) {
    // `<article>` only appears inside the script body, which is skipped.
    let snapshot = HtmlSnapshot::parse(DOC_PAGE);
    assert_eq!(snapshot.has_selector(selector), expected, "{selector}");
}

#[test]
fn test_snapshot_ids_classes_and_attributes() {
    let snapshot = HtmlSnapshot::parse(
        r#"<div id="table-of-contents" class="toc wide" data-docs></div><!-- <main> -->"#,
    );
    assert!(snapshot.has_selector("#table-of-contents"));
    assert!(snapshot.has_selector(".toc"));
    assert!(snapshot.has_selector("[data-docs]"));
    assert!(snapshot.has_selector("div.wide"));
    assert!(!snapshot.has_selector("main"));
}

#[test]
fn test_snapshot_first_heading_decodes_entities() {
    let snapshot = HtmlSnapshot::parse("<h1>  Tips &amp;\n Tricks </h1><h1>Second</h1>");
    assert_eq!(snapshot.first_heading_text().as_deref(), Some("Tips & Tricks"));
}

#[test]
fn test_snapshot_without_heading() {
    let snapshot = HtmlSnapshot::parse("<p>No heading here</p>");
    assert_eq!(snapshot.first_heading_text(), None);
    assert_eq!(snapshot.element_count(), 1);
}

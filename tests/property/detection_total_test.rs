//! Property-based tests for documentation detection.
//!
//! Detection never panics, agrees with its own summary forms, and keeps the
//! tier ordering for arbitrary inputs.

use proptest::prelude::*;

use docsfocus::services::docs_detector::{DocsDetector, DocsDetectorTrait, PATH_KEYWORDS};
use docsfocus::services::html_snapshot::{DomContext, HtmlSnapshot};
use docsfocus::types::detection::DetectionReason;

fn arb_host_label() -> impl Strategy<Value = String> {
    "[a-z]{3,8}".prop_filter("must not be a docs keyword", |label| {
        !["docs", "doc", "developer", "devdocs", "api", "reference", "manual"].contains(&label.as_str())
    })
}

fn arb_plain_url() -> impl Strategy<Value = String> {
    (arb_host_label(), arb_host_label(), prop::collection::vec("[a-z0-9]{1,8}", 0..4)).prop_map(
        |(sub, domain, segments)| format!("https://{}.{}.net/{}", sub, domain, segments.join("/")),
    )
}

proptest! {
    #[test]
    fn analyze_never_panics_on_arbitrary_strings(url in ".{0,80}") {
        let detector = DocsDetector::new();
        let result = detector.analyze(&url, None);
        prop_assert_eq!(result.matched, result.reason != DetectionReason::None);
        prop_assert_eq!(result.matched, !result.signals.is_empty());
    }

    #[test]
    fn snapshot_parse_never_panics(html in ".{0,200}") {
        let snapshot = HtmlSnapshot::parse(&html);
        let _ = snapshot.first_heading_text();
        let _ = DocsDetector::new().analyze("https://example.com/", Some(&snapshot));
    }

    #[test]
    fn describe_agrees_with_analyze(url in arb_plain_url()) {
        let detector = DocsDetector::new();
        let result = detector.analyze(&url, None);
        let described = detector.describe(&url, None);
        prop_assert_eq!(described.matched, result.matched);
        prop_assert_eq!(described.reason, result.reason);
        prop_assert_eq!(detector.is_documentation(&url, None), result.matched);
    }

    #[test]
    fn path_keyword_is_detected_anywhere_in_path(
        host in arb_host_label(),
        prefix in prop::collection::vec("[a-z0-9]{1,6}", 0..3),
        keyword in prop::sample::select(PATH_KEYWORDS.to_vec()),
    ) {
        let mut segments = prefix;
        segments.push(keyword.to_string());
        let url = format!("https://www.{}.net/{}", host, segments.join("/"));
        let result = DocsDetector::new().analyze(&url, None);
        prop_assert!(result.matched);
        // `/docs/` is itself a known pattern, so it may win first.
        prop_assert!(matches!(result.reason, DetectionReason::PathKeyword | DetectionReason::Pattern));
    }

    #[test]
    fn page_structure_never_overrides_url_match(url in arb_plain_url(), html in ".{0,120}") {
        let detector = DocsDetector::new();
        let snapshot = HtmlSnapshot::parse(&html);
        let without = detector.analyze(&url, None);
        let with = detector.analyze(&url, Some(&snapshot as &dyn DomContext));
        if without.matched {
            prop_assert_eq!(without, with);
        }
    }
}

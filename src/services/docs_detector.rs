//! Documentation-page detection.
//!
//! A four-tier cascade, first match wins: known documentation sites, host
//! labels, path segments, then page structure when a document is available.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::html_snapshot::DomContext;
use crate::types::detection::{DetectionReason, DetectionResult, DocsMatch};

const DOCS_PATTERN_SOURCES: &[&str] = &[
    r"developer\.mozilla\.org",
    r"docs\.github\.com",
    r"npmjs\.com/package",
    r"docs\.python\.org",
    r"doc\.rust-lang\.org",
    r"docs\.rs",
    r"readthedocs\.io",
    r"go\.dev",
    r"pkg\.go\.dev",
    r"nodejs\.org/api",
    r"docs\.oracle\.com",
    r"learn\.microsoft\.com",
    r"docs\.djangoproject\.com",
    r"kotlinlang\.org/docs",
    r"doc\.qt\.io",
    r"laravel\.com/docs",
    r"ruby-doc\.org",
    r"/docs/",
    r"^https?://api\.",
];

pub const HOST_KEYWORDS: &[&str] = &[
    "docs", "doc", "developer", "devdocs", "api", "reference", "manual",
];

pub const PATH_KEYWORDS: &[&str] = &[
    "docs",
    "documentation",
    "reference",
    "api",
    "guide",
    "manual",
    "tutorial",
    "handbook",
];

/// Structural markers of documentation layouts, checked in order.
pub const DOM_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    "[data-docs]",
    "[data-doc-page]",
    "[data-docsearch]",
    r#"nav[aria-label="breadcrumb"]"#,
    ".breadcrumb",
    ".breadcrumbs",
    ".sidebar",
    ".docs-sidebar",
    ".toc",
    "#table-of-contents",
];

/// Lazy static initialization for regex patterns
static DOCS_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    DOCS_PATTERN_SOURCES
        .iter()
        .filter_map(|source| Regex::new(source).ok().map(|re| (*source, re)))
        .collect()
});

static HEADING_KEYWORDS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(docs?|documentation|reference|api|guide|manual|tutorial|handbook|getting started|introduction|overview|quick ?start|install(ation)?)\b",
    )
    .ok()
});

/// Trait defining documentation detection.
pub trait DocsDetectorTrait {
    fn analyze(&self, url: &str, dom: Option<&dyn DomContext>) -> DetectionResult;
    fn describe(&self, url: &str, dom: Option<&dyn DomContext>) -> DocsMatch;
    fn is_documentation(&self, url: &str, dom: Option<&dyn DomContext>) -> bool;
}

/// Stateless detector over the built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocsDetector;

impl DocsDetector {
    pub fn new() -> Self {
        Self
    }

    /// Runs the cascade on an already-parsed URL.
    pub fn analyze_url(&self, url: &Url, dom: Option<&dyn DomContext>) -> DetectionResult {
        let href = url.as_str();
        let host = url.host_str().unwrap_or("").to_lowercase();

        if let Some(result) = Self::match_pattern(href, &host) {
            return result;
        }
        if let Some(result) = Self::match_host(&host) {
            return result;
        }
        if let Some(result) = Self::match_path(url.path()) {
            return result;
        }
        if let Some(dom) = dom {
            if let Some(result) = Self::match_dom(dom) {
                return result;
            }
        }
        DetectionResult::negative()
    }

    fn match_pattern(href: &str, host: &str) -> Option<DetectionResult> {
        DOCS_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(href) || re.is_match(host))
            .map(|(source, _)| {
                DetectionResult::matched(DetectionReason::Pattern, vec![format!("pattern:{source}")])
            })
    }

    fn match_host(host: &str) -> Option<DetectionResult> {
        host.split('.')
            .find(|label| HOST_KEYWORDS.contains(label))
            .map(|label| {
                DetectionResult::matched(DetectionReason::HostKeyword, vec![format!("host:{label}")])
            })
    }

    fn match_path(path: &str) -> Option<DetectionResult> {
        path.split('/')
            .map(str::to_lowercase)
            .find(|segment| PATH_KEYWORDS.contains(&segment.as_str()))
            .map(|segment| {
                DetectionResult::matched(DetectionReason::PathKeyword, vec![format!("path:{segment}")])
            })
    }

    /// A structural marker must be present, and the first heading (if any)
    /// must read like documentation.
    fn match_dom(dom: &dyn DomContext) -> Option<DetectionResult> {
        let selector = DOM_SELECTORS.iter().find(|sel| dom.has_selector(sel))?;
        let heading_signal = match dom.first_heading_text() {
            None => "heading:none".to_string(),
            Some(text) => {
                let keyworded = HEADING_KEYWORDS
                    .as_ref()
                    .map(|re| re.is_match(&text))
                    .unwrap_or(false);
                if !keyworded {
                    debug!(selector, heading = %text, "layout matched but heading did not");
                    return None;
                }
                format!("heading:{text}")
            }
        };
        Some(DetectionResult::matched(
            DetectionReason::DomStructure,
            vec![format!("selector:{selector}"), heading_signal],
        ))
    }
}

impl DocsDetectorTrait for DocsDetector {
    fn analyze(&self, url: &str, dom: Option<&dyn DomContext>) -> DetectionResult {
        match Url::parse(url.trim()) {
            Ok(parsed) => self.analyze_url(&parsed, dom),
            Err(e) => {
                debug!(url, error = %e, "unparseable URL treated as non-documentation");
                DetectionResult::negative()
            }
        }
    }

    fn describe(&self, url: &str, dom: Option<&dyn DomContext>) -> DocsMatch {
        DocsMatch::from(self.analyze(url, dom))
    }

    fn is_documentation(&self, url: &str, dom: Option<&dyn DomContext>) -> bool {
        self.analyze(url, dom).matched
    }
}

use serde::{Deserialize, Serialize};

/// Which detection tier produced the verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionReason {
    Pattern,
    HostKeyword,
    PathKeyword,
    DomStructure,
    None,
}

impl DetectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionReason::Pattern => "pattern",
            DetectionReason::HostKeyword => "host-keyword",
            DetectionReason::PathKeyword => "path-keyword",
            DetectionReason::DomStructure => "dom-structure",
            DetectionReason::None => "none",
        }
    }

    /// Fixed UI label for the reason.
    pub fn label(&self) -> &'static str {
        match self {
            DetectionReason::Pattern => "Matched a known documentation site.",
            DetectionReason::HostKeyword => "Domain name suggests documentation.",
            DetectionReason::PathKeyword => "URL path suggests documentation.",
            DetectionReason::DomStructure => "Page layout looks like documentation.",
            DetectionReason::None => "No documentation signals detected.",
        }
    }
}

/// Outcome of one detection run. Computed fresh per URL, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    pub matched: bool,
    pub reason: DetectionReason,
    /// Diagnostic strings in the order they were gathered.
    pub signals: Vec<String>,
}

impl DetectionResult {
    pub fn negative() -> Self {
        Self {
            matched: false,
            reason: DetectionReason::None,
            signals: Vec::new(),
        }
    }

    pub fn matched(reason: DetectionReason, signals: Vec<String>) -> Self {
        Self {
            matched: true,
            reason,
            signals,
        }
    }
}

/// Detection result with its display label, as shown by the popup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocsMatch {
    pub matched: bool,
    pub label: String,
    pub reason: DetectionReason,
    pub signals: Vec<String>,
}

impl From<DetectionResult> for DocsMatch {
    fn from(result: DetectionResult) -> Self {
        let label = if result.matched {
            result.reason.label()
        } else {
            DetectionReason::None.label()
        };
        Self {
            matched: result.matched,
            label: label.to_string(),
            reason: result.reason,
            signals: result.signals,
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lower bound for the paragraph collapse threshold, in characters.
pub const MIN_COLLAPSE_THRESHOLD: u32 = 120;
/// Upper bound for the paragraph collapse threshold, in characters.
pub const MAX_COLLAPSE_THRESHOLD: u32 = 2000;
pub const DEFAULT_COLLAPSE_THRESHOLD: u32 = 400;

/// Preset tag used when the settings match no known preset.
pub const CUSTOM_PRESET: &str = "custom";
pub const DEFAULT_PRESET: &str = "deepfocus";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "function", "const", "let", "var", "class", "interface", "type", "import", "export",
    "async", "await", "return", "throw", "try", "catch", "promise", "API", "endpoint",
    "method", "route", "request", "response",
];

/// Boolean toggles compared when deciding which preset a configuration matches.
///
/// `dyslexiaMode`, `keywords` and `readingMaskConfig` are not compared. A new
/// toggle on [`Settings`] does not affect preset detection unless listed here.
pub const COMPARISON_TOGGLES: [&str; 8] = [
    "highlightInCode",
    "previewTlDr",
    "readingMask",
    "collapsibleSections",
    "trimChrome",
    "sectionTracker",
    "keyboardShortcuts",
    "collapseCodeParagraphs",
];

/// Every boolean-typed top-level field, in storage naming.
pub const BOOLEAN_FIELDS: [&str; 9] = [
    "highlightInCode",
    "previewTlDr",
    "readingMask",
    "collapsibleSections",
    "trimChrome",
    "sectionTracker",
    "keyboardShortcuts",
    "dyslexiaMode",
    "collapseCodeParagraphs",
];

/// Canonical, fully-populated settings record.
///
/// Field names serialize in camelCase so the stored blob keeps the shape the
/// browser side writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub collapse_threshold: u32,
    pub keywords: Vec<String>,
    pub highlight_in_code: bool,
    pub preview_tl_dr: bool,
    pub reading_mask: bool,
    pub collapsible_sections: bool,
    pub trim_chrome: bool,
    pub section_tracker: bool,
    pub keyboard_shortcuts: bool,
    pub dyslexia_mode: bool,
    pub collapse_code_paragraphs: bool,
    pub reading_mask_config: ReadingMaskConfig,
    pub preset: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD,
            keywords: Self::default_keywords(),
            highlight_in_code: true,
            preview_tl_dr: true,
            reading_mask: true,
            collapsible_sections: true,
            trim_chrome: true,
            section_tracker: true,
            keyboard_shortcuts: true,
            dyslexia_mode: false,
            collapse_code_paragraphs: false,
            reading_mask_config: ReadingMaskConfig::default(),
            preset: DEFAULT_PRESET.to_string(),
        }
    }
}

impl Settings {
    pub fn default_keywords() -> Vec<String> {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }

    /// Reads a boolean toggle by its storage name.
    pub fn toggle(&self, field: &str) -> Option<bool> {
        match field {
            "highlightInCode" => Some(self.highlight_in_code),
            "previewTlDr" => Some(self.preview_tl_dr),
            "readingMask" => Some(self.reading_mask),
            "collapsibleSections" => Some(self.collapsible_sections),
            "trimChrome" => Some(self.trim_chrome),
            "sectionTracker" => Some(self.section_tracker),
            "keyboardShortcuts" => Some(self.keyboard_shortcuts),
            "dyslexiaMode" => Some(self.dyslexia_mode),
            "collapseCodeParagraphs" => Some(self.collapse_code_paragraphs),
            _ => None,
        }
    }

    /// Writes a boolean toggle by its storage name. Returns false for unknown fields.
    pub fn set_toggle(&mut self, field: &str, value: bool) -> bool {
        let slot = match field {
            "highlightInCode" => &mut self.highlight_in_code,
            "previewTlDr" => &mut self.preview_tl_dr,
            "readingMask" => &mut self.reading_mask,
            "collapsibleSections" => &mut self.collapsible_sections,
            "trimChrome" => &mut self.trim_chrome,
            "sectionTracker" => &mut self.section_tracker,
            "keyboardShortcuts" => &mut self.keyboard_shortcuts,
            "dyslexiaMode" => &mut self.dyslexia_mode,
            "collapseCodeParagraphs" => &mut self.collapse_code_paragraphs,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Projection onto the preset comparison fields.
    pub fn fingerprint(&self) -> PresetFingerprint {
        let mut toggles = [false; 8];
        for (slot, field) in toggles.iter_mut().zip(COMPARISON_TOGGLES.iter()) {
            *slot = self.toggle(field).unwrap_or(false);
        }
        PresetFingerprint {
            collapse_threshold: self.collapse_threshold,
            toggles,
        }
    }

    /// Raw JSON form, as stored and as accepted by the normalizer.
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// The subset of settings that decides preset identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresetFingerprint {
    pub collapse_threshold: u32,
    pub toggles: [bool; 8],
}

/// Geometry and look of the reading mask overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingMaskConfig {
    pub enabled: bool,
    /// Focus band height as a fraction of the viewport.
    pub focus_height_ratio: f64,
    pub min_focus_height: f64,
    pub max_focus_height: f64,
    /// Vertical position of the band when the pointer is outside the page.
    pub default_position_ratio: f64,
    pub overlay_opacity: f64,
}

impl Default for ReadingMaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_height_ratio: 0.32,
            min_focus_height: 160.0,
            max_focus_height: 360.0,
            default_position_ratio: 0.33,
            overlay_opacity: 0.62,
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::settings::CUSTOM_PRESET;

/// A named, partial settings record in raw storage form.
pub type PresetDefinition = Map<String, Value>;

/// Custom presets as persisted: name → partial settings.
pub type CustomPresets = BTreeMap<String, Value>;

/// Retired preset identifiers and the preset that replaced them.
const DEFAULT_ALIASES: &[(&str, &str)] = &[("adhd", "deepfocus"), ("focus", "deepfocus")];

fn deepfocus_definition() -> PresetDefinition {
    object(json!({
        "collapseThreshold": 400,
        "highlightInCode": true,
        "previewTlDr": true,
        "readingMask": true,
        "collapsibleSections": true,
        "trimChrome": true,
        "sectionTracker": true,
        "keyboardShortcuts": true,
        "collapseCodeParagraphs": false
    }))
}

fn skim_definition() -> PresetDefinition {
    object(json!({
        "collapseThreshold": 220,
        "highlightInCode": false,
        "previewTlDr": true,
        "readingMask": false,
        "collapsibleSections": true,
        "trimChrome": true,
        "sectionTracker": true,
        "keyboardShortcuts": false,
        "collapseCodeParagraphs": true
    }))
}

fn object(value: Value) -> PresetDefinition {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The set of presets known to one execution context.
///
/// Built-ins are code-defined and scanned first, in declaration order; custom
/// presets follow in name order. Aliases map retired names onto current ones
/// and are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    builtins: Vec<(String, PresetDefinition)>,
    aliases: BTreeMap<String, String>,
    custom: CustomPresets,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetCatalog {
    /// Catalog with the built-in presets and the default alias table.
    pub fn builtin() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect();
        Self {
            builtins: vec![
                ("deepfocus".to_string(), deepfocus_definition()),
                ("skim".to_string(), skim_definition()),
            ],
            aliases,
            custom: CustomPresets::new(),
        }
    }

    /// Adds or replaces a legacy alias.
    pub fn with_alias(mut self, retired: &str, current: &str) -> Self {
        self.aliases
            .insert(retired.trim().to_lowercase(), current.to_string());
        self
    }

    /// Replaces the alias table.
    pub fn with_aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
            .collect();
        self
    }

    /// Attaches the user's custom presets so they take part in lookups and matching.
    pub fn with_custom(mut self, custom: CustomPresets) -> Self {
        self.custom = custom;
        self
    }

    pub fn custom(&self) -> &CustomPresets {
        &self.custom
    }

    /// Maps a retired identifier onto its replacement; other names pass through.
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        match self.aliases.get(&name.trim().to_lowercase()) {
            Some(current) => current.as_str(),
            None => name,
        }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|(n, _)| n == name)
    }

    pub fn builtin_names(&self) -> impl Iterator<Item = &str> {
        self.builtins.iter().map(|(n, _)| n.as_str())
    }

    /// Looks up a definition, built-ins first, after alias resolution.
    pub fn definition(&self, name: &str) -> Option<PresetDefinition> {
        let name = self.canonical_name(name);
        if let Some((_, def)) = self.builtins.iter().find(|(n, _)| n == name) {
            return Some(def.clone());
        }
        match self.custom.get(name) {
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => Some(Map::new()),
            None => None,
        }
    }

    /// All preset names in matching order.
    pub fn names(&self) -> Vec<&str> {
        self.builtins
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.custom.keys().map(String::as_str))
            .collect()
    }

    /// Whether a name may not be used for a custom preset.
    pub fn is_reserved(&self, name: &str) -> bool {
        let lowered = name.trim().to_lowercase();
        lowered == CUSTOM_PRESET
            || self.builtins.iter().any(|(n, _)| n.to_lowercase() == lowered)
            || self.aliases.contains_key(&lowered)
    }
}

/// Human-readable label for a preset tag.
pub fn preset_label(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "deepfocus" => "Deep Focus".to_string(),
        "skim" => "Skim (fast scan)".to_string(),
        "custom" | "" => "Custom".to_string(),
        _ => name.to_string(),
    }
}

/// Which built-in presets appear in pickers. Missing entries mean visible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PresetVisibility(pub BTreeMap<String, bool>);

impl PresetVisibility {
    pub fn is_visible(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(true)
    }

    pub fn set(&mut self, name: &str, visible: bool) {
        self.0.insert(name.to_string(), visible);
    }

    /// Lenient read of the stored table; non-boolean entries are skipped.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let mut visibility = Self::default();
        if let Some(Value::Object(map)) = raw {
            for (name, value) in map {
                if let Value::Bool(flag) = value {
                    visibility.set(name, *flag);
                }
            }
        }
        visibility
    }
}

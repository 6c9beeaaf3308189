//! Settings resolution.
//!
//! Turns arbitrary stored JSON into canonical [`Settings`], layers per-domain
//! overrides over global settings, applies presets, and decides which preset
//! a configuration matches. Every function here is pure and total: malformed
//! input falls back to defaults instead of failing.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::types::preset::{CustomPresets, PresetCatalog, PresetDefinition};
use crate::types::settings::{
    PresetFingerprint, ReadingMaskConfig, Settings, BOOLEAN_FIELDS, CUSTOM_PRESET,
    MAX_COLLAPSE_THRESHOLD, MIN_COLLAPSE_THRESHOLD,
};

static BUILTIN_RESOLVER: Lazy<SettingsResolver> = Lazy::new(SettingsResolver::default);

/// Supplies the user's custom presets to [`SettingsResolver::apply_preset`].
#[async_trait]
pub trait CustomPresetSource: Send + Sync {
    async fn custom_presets(&self) -> CustomPresets;
}

#[async_trait]
impl CustomPresetSource for CustomPresets {
    async fn custom_presets(&self) -> CustomPresets {
        self.clone()
    }
}

/// A source with no custom presets.
pub struct NoCustomPresets;

#[async_trait]
impl CustomPresetSource for NoCustomPresets {
    async fn custom_presets(&self) -> CustomPresets {
        CustomPresets::new()
    }
}

/// Resolution against one preset catalog.
#[derive(Debug, Clone, Default)]
pub struct SettingsResolver {
    catalog: PresetCatalog,
}

impl SettingsResolver {
    pub fn new(catalog: PresetCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    /// Canonical settings for any input shape.
    pub fn normalize(&self, raw: &Value) -> Settings {
        let mut settings = normalize_fields(raw);
        let requested = raw
            .as_object()
            .and_then(|map| map.get("preset"))
            .and_then(Value::as_str);
        settings.preset = self.resolve_preset(&settings, requested);
        settings
    }

    /// `normalize(base ⊕ override)`, shallow.
    pub fn merge_settings(&self, base: &Value, overlay: &Value) -> Settings {
        self.normalize(&Value::Object(shallow_merge(&[base, overlay])))
    }

    /// Domain settings win over global settings when present.
    pub fn resolve_effective_settings(&self, global: &Value, domain: Option<&Value>) -> Settings {
        match domain {
            Some(domain) if !domain.is_null() => self.merge_settings(global, domain),
            _ => self.normalize(global),
        }
    }

    /// Applies a built-in or custom preset over `base`.
    ///
    /// Unknown names leave `base` unchanged apart from normalization.
    pub async fn apply_preset(
        &self,
        name: &str,
        base: &Value,
        source: &dyn CustomPresetSource,
    ) -> Settings {
        let canonical = self.catalog.canonical_name(name).to_string();
        if self.catalog.is_builtin(&canonical) {
            if let Some(definition) = self.catalog.definition(&canonical) {
                return self.overlay_preset(&self.catalog, &canonical, base, definition);
            }
        }

        let custom = source.custom_presets().await;
        let catalog = self.catalog.clone().with_custom(custom);
        match catalog.definition(&canonical) {
            Some(definition) => self.overlay_preset(&catalog, &canonical, base, definition),
            None => {
                tracing::debug!(preset = name, "unknown preset, leaving settings unchanged");
                SettingsResolver::new(catalog).normalize(base)
            }
        }
    }

    fn overlay_preset(
        &self,
        catalog: &PresetCatalog,
        name: &str,
        base: &Value,
        definition: PresetDefinition,
    ) -> Settings {
        let mut tag = Map::new();
        tag.insert("preset".to_string(), Value::String(name.to_string()));
        let merged = shallow_merge(&[base, &Value::Object(definition), &Value::Object(tag)]);
        SettingsResolver::new(catalog.clone()).normalize(&Value::Object(merged))
    }

    /// The preset tag for already-normalized fields.
    ///
    /// The requested name (after alias resolution) is kept when its definition
    /// matches exactly; otherwise the first exact match in catalog order wins,
    /// else [`CUSTOM_PRESET`].
    pub fn resolve_preset(&self, settings: &Settings, requested: Option<&str>) -> String {
        let fingerprint = settings.fingerprint();

        if let Some(requested) = requested {
            let canonical = self.catalog.canonical_name(requested);
            if self.definition_fingerprint(canonical) == Some(fingerprint) {
                return canonical.to_string();
            }
        }

        self.catalog
            .names()
            .into_iter()
            .find(|name| self.definition_fingerprint(name) == Some(fingerprint))
            .map(str::to_string)
            .unwrap_or_else(|| CUSTOM_PRESET.to_string())
    }

    fn definition_fingerprint(&self, name: &str) -> Option<PresetFingerprint> {
        self.catalog
            .definition(name)
            .map(|definition| normalize_fields(&Value::Object(definition)).fingerprint())
    }
}

/// [`SettingsResolver::normalize`] with the built-in catalog.
pub fn normalize(raw: &Value) -> Settings {
    BUILTIN_RESOLVER.normalize(raw)
}

/// [`SettingsResolver::merge_settings`] with the built-in catalog.
pub fn merge_settings(base: &Value, overlay: &Value) -> Settings {
    BUILTIN_RESOLVER.merge_settings(base, overlay)
}

/// [`SettingsResolver::resolve_effective_settings`] with the built-in catalog.
pub fn resolve_effective_settings(global: &Value, domain: Option<&Value>) -> Settings {
    BUILTIN_RESOLVER.resolve_effective_settings(global, domain)
}

/// Later layers win; non-object layers contribute nothing.
pub fn shallow_merge(layers: &[&Value]) -> Map<String, Value> {
    let mut merged = Map::new();
    for layer in layers {
        if let Value::Object(map) = layer {
            for (key, value) in map {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Normalizes every field except the preset tag, which is left at its default.
fn normalize_fields(raw: &Value) -> Settings {
    let mut settings = Settings::default();
    let Some(map) = raw.as_object() else {
        return settings;
    };

    if let Some(value) = map.get("collapseThreshold") {
        settings.collapse_threshold = coerce_threshold(value);
    }
    if let Some(value) = map.get("keywords") {
        settings.keywords = coerce_keywords(value);
    }
    for field in BOOLEAN_FIELDS {
        if let Some(value) = map.get(field) {
            settings.set_toggle(field, truthy(value));
        }
    }
    if let Some(value) = map.get("readingMaskConfig") {
        settings.reading_mask_config = coerce_mask_config(value);
    }
    settings
}

/// Loose numeric conversion: numbers, numeric strings, booleans and null.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Truthiness: `false`, `null`, `0`, `""` are false; everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_threshold(value: &Value) -> u32 {
    match coerce_number(value).filter(|n| n.is_finite()) {
        Some(n) => n
            .clamp(MIN_COLLAPSE_THRESHOLD as f64, MAX_COLLAPSE_THRESHOLD as f64)
            .round() as u32,
        None => Settings::default().collapse_threshold,
    }
}

/// Trimmed, non-empty, first-seen-unique strings; defaults when nothing survives.
fn coerce_keywords(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Settings::default_keywords();
    };
    let mut keywords: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(text) = item.as_str() else { continue };
        let text = text.trim();
        if !text.is_empty() && !keywords.iter().any(|k| k == text) {
            keywords.push(text.to_string());
        }
    }
    if keywords.is_empty() {
        Settings::default_keywords()
    } else {
        keywords
    }
}

fn coerce_mask_config(value: &Value) -> ReadingMaskConfig {
    let mut config = ReadingMaskConfig::default();
    let Value::Object(map) = value else {
        return config;
    };
    if let Some(enabled) = map.get("enabled") {
        config.enabled = truthy(enabled);
    }
    let numeric = |key: &str, fallback: f64| {
        map.get(key)
            .and_then(coerce_number)
            .filter(|n| n.is_finite())
            .unwrap_or(fallback)
    };
    config.focus_height_ratio = numeric("focusHeightRatio", config.focus_height_ratio);
    config.min_focus_height = numeric("minFocusHeight", config.min_focus_height);
    config.max_focus_height = numeric("maxFocusHeight", config.max_focus_height);
    config.default_position_ratio = numeric("defaultPositionRatio", config.default_position_ratio);
    config.overlay_opacity = numeric("overlayOpacity", config.overlay_opacity);
    config
}

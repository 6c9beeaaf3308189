// DocsFocus Preset Store
// Custom preset CRUD and built-in preset visibility, persisted in the shared key/value store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::settings_resolver::{CustomPresetSource, SettingsResolver};
use crate::storage::{keys, FallbackStore};
use crate::types::errors::{PresetError, StorageError};
use crate::types::preset::{CustomPresets, PresetCatalog, PresetVisibility};
use crate::types::settings::{Settings, BOOLEAN_FIELDS, CUSTOM_PRESET, DEFAULT_PRESET};

/// Fields captured from a settings snapshot when saving a custom preset.
const SAVED_FIELDS: &[&str] = &["collapseThreshold", "keywords", "readingMaskConfig"];

/// Lenient view of a stored custom preset table; entries that are not objects are skipped.
pub fn custom_presets_from_raw(raw: Option<&Value>) -> CustomPresets {
    match raw {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, definition)| definition.is_object())
            .map(|(name, definition)| (name.clone(), definition.clone()))
            .collect(),
        Some(other) => {
            warn!(found = %other, "ignoring malformed custom preset table");
            CustomPresets::new()
        }
        None => CustomPresets::new(),
    }
}

/// Reads the custom preset table, treating failures as empty.
pub(crate) async fn read_custom_presets(store: &FallbackStore) -> CustomPresets {
    let raw = store.get_lenient(keys::CUSTOM_PRESETS).await;
    custom_presets_from_raw(raw.as_ref())
}

/// Trait defining the preset store interface.
#[async_trait]
pub trait PresetStoreTrait: Send + Sync {
    async fn get_custom_presets(&self) -> CustomPresets;
    async fn save_custom_preset(&self, name: &str, settings: &Value) -> Result<String, PresetError>;
    async fn delete_custom_preset(&self, name: &str) -> Result<bool, PresetError>;
    async fn get_preset_visibility(&self) -> PresetVisibility;
    async fn set_preset_visibility(&self, name: &str, visible: bool) -> Result<PresetVisibility, PresetError>;
    async fn list_selectable_presets(&self) -> Vec<String>;
    async fn apply_preset(&self, name: &str, base: &Value) -> Settings;
}

pub struct PresetStore {
    store: Arc<FallbackStore>,
    catalog: PresetCatalog,
}

impl PresetStore {
    pub fn new(store: Arc<FallbackStore>) -> Self {
        Self::with_catalog(store, PresetCatalog::builtin())
    }

    pub fn with_catalog(store: Arc<FallbackStore>, catalog: PresetCatalog) -> Self {
        Self { store, catalog }
    }

    /// The part of a normalized snapshot that a custom preset remembers.
    fn snapshot(settings: &Settings) -> Value {
        let raw = settings.to_raw();
        let mut saved = Map::new();
        for field in SAVED_FIELDS.iter().chain(BOOLEAN_FIELDS.iter()) {
            if let Some(value) = raw.get(*field) {
                saved.insert(field.to_string(), value.clone());
            }
        }
        Value::Object(saved)
    }
}

#[async_trait]
impl CustomPresetSource for PresetStore {
    async fn custom_presets(&self) -> CustomPresets {
        read_custom_presets(&self.store).await
    }
}

#[async_trait]
impl PresetStoreTrait for PresetStore {
    async fn get_custom_presets(&self) -> CustomPresets {
        read_custom_presets(&self.store).await
    }

    /// Returns the trimmed name the preset was stored under.
    async fn save_custom_preset(&self, name: &str, settings: &Value) -> Result<String, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        if self.catalog.is_reserved(name) {
            return Err(PresetError::ReservedName(name.to_string()));
        }

        let mut presets = read_custom_presets(&self.store).await;
        let lowered = name.to_lowercase();
        if presets.keys().any(|existing| existing.to_lowercase() == lowered) {
            return Err(PresetError::DuplicateName(name.to_string()));
        }

        let normalized = SettingsResolver::new(self.catalog.clone()).normalize(settings);
        presets.insert(name.to_string(), Self::snapshot(&normalized));
        let table: Map<String, Value> = presets.into_iter().collect();
        self.store
            .set_one(keys::CUSTOM_PRESETS, Value::Object(table))
            .await?;
        info!(preset = name, "custom preset saved");
        Ok(name.to_string())
    }

    /// Deleting the active global preset resets global settings to the default preset.
    async fn delete_custom_preset(&self, name: &str) -> Result<bool, PresetError> {
        let mut presets = read_custom_presets(&self.store).await;
        if presets.remove(name).is_none() {
            return Ok(false);
        }

        let active = self
            .store
            .get_lenient(keys::SETTINGS)
            .await
            .and_then(|raw| raw.get("preset").and_then(Value::as_str).map(str::to_string));

        let table: Map<String, Value> = presets.into_iter().collect();
        self.store
            .set_one(keys::CUSTOM_PRESETS, Value::Object(table))
            .await?;
        info!(preset = name, "custom preset deleted");

        if active.as_deref() == Some(name) {
            let reset = SettingsResolver::new(self.catalog.clone())
                .apply_preset(DEFAULT_PRESET, &Settings::default().to_raw(), self)
                .await;
            self.store.set_one(keys::SETTINGS, reset.to_raw()).await?;
            info!(preset = name, "active preset deleted, global settings reset");
        }
        Ok(true)
    }

    async fn get_preset_visibility(&self) -> PresetVisibility {
        let raw = self.store.get_lenient(keys::PRESET_VISIBILITY).await;
        PresetVisibility::from_raw(raw.as_ref())
    }

    /// Only built-in presets can be hidden.
    async fn set_preset_visibility(&self, name: &str, visible: bool) -> Result<PresetVisibility, PresetError> {
        if !self.catalog.is_builtin(name) {
            return Err(PresetError::UnknownBuiltin(name.to_string()));
        }
        let mut visibility = self.get_preset_visibility().await;
        visibility.set(name, visible);
        let encoded = serde_json::to_value(&visibility).map_err(StorageError::from)?;
        self.store.set_one(keys::PRESET_VISIBILITY, encoded).await?;
        Ok(visibility)
    }

    /// Picker contents: visible built-ins, custom presets, then the custom sentinel.
    async fn list_selectable_presets(&self) -> Vec<String> {
        let visibility = self.get_preset_visibility().await;
        let mut names: Vec<String> = self
            .catalog
            .builtin_names()
            .filter(|name| visibility.is_visible(name))
            .map(str::to_string)
            .collect();
        names.extend(read_custom_presets(&self.store).await.into_keys());
        names.push(CUSTOM_PRESET.to_string());
        names
    }

    async fn apply_preset(&self, name: &str, base: &Value) -> Settings {
        SettingsResolver::new(self.catalog.clone())
            .apply_preset(name, base, self)
            .await
    }
}

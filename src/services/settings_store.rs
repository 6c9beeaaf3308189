// DocsFocus Settings Store
// Persists global settings, focus mode and per-domain settings in the shared key/value store.
// Every read normalizes; every write stores the normalized record.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::preset_store::read_custom_presets;
use super::settings_resolver::SettingsResolver;
use crate::storage::{keys, FallbackStore};
use crate::types::errors::SettingsError;
use crate::types::preset::PresetCatalog;
use crate::types::settings::Settings;

/// Trait defining the settings store interface.
#[async_trait]
pub trait SettingsStoreTrait: Send + Sync {
    /// A resolver that also knows the user's custom presets.
    async fn resolver(&self) -> SettingsResolver;
    async fn get_settings(&self) -> Settings;
    async fn set_settings(&self, raw: &Value) -> Result<Settings, SettingsError>;
    async fn reset_settings(&self) -> Result<Settings, SettingsError>;
    async fn get_focus_mode(&self) -> bool;
    async fn set_focus_mode(&self, enabled: bool) -> Result<(), SettingsError>;
    async fn get_domain_settings(&self) -> BTreeMap<String, Settings>;
    async fn get_domain_settings_for(&self, domain: &str) -> Option<Settings>;
    async fn set_domain_settings(&self, domain: &str, raw: &Value) -> Result<Settings, SettingsError>;
    async fn clear_domain_settings(&self, domain: &str) -> Result<bool, SettingsError>;
    async fn effective_settings_for(&self, domain: Option<&str>) -> Settings;
}

pub struct SettingsStore {
    store: Arc<FallbackStore>,
    catalog: PresetCatalog,
}

impl SettingsStore {
    pub fn new(store: Arc<FallbackStore>) -> Self {
        Self::with_catalog(store, PresetCatalog::builtin())
    }

    /// Uses `catalog` for built-ins and aliases; custom presets are read from storage.
    pub fn with_catalog(store: Arc<FallbackStore>, catalog: PresetCatalog) -> Self {
        Self { store, catalog }
    }

    /// The stored global blob, unnormalized. `Null` when absent.
    pub async fn raw_settings(&self) -> Value {
        self.store
            .get_lenient(keys::SETTINGS)
            .await
            .unwrap_or(Value::Null)
    }

    async fn raw_domain_table(&self) -> Map<String, Value> {
        match self.store.get_lenient(keys::DOMAIN_SETTINGS).await {
            Some(Value::Object(table)) => table,
            _ => Map::new(),
        }
    }
}

fn domain_key(domain: &str) -> Result<String, SettingsError> {
    let key = domain.trim().to_lowercase();
    if key.is_empty() {
        return Err(SettingsError::InvalidDomain(domain.to_string()));
    }
    Ok(key)
}

#[async_trait]
impl SettingsStoreTrait for SettingsStore {
    async fn resolver(&self) -> SettingsResolver {
        let custom = read_custom_presets(&self.store).await;
        SettingsResolver::new(self.catalog.clone().with_custom(custom))
    }

    /// Defaults when nothing is stored or storage is unreachable.
    async fn get_settings(&self) -> Settings {
        let raw = self.raw_settings().await;
        self.resolver().await.normalize(&raw)
    }

    async fn set_settings(&self, raw: &Value) -> Result<Settings, SettingsError> {
        let settings = self.resolver().await.normalize(raw);
        self.store.set_one(keys::SETTINGS, settings.to_raw()).await?;
        debug!(preset = %settings.preset, "global settings saved");
        Ok(settings)
    }

    async fn reset_settings(&self) -> Result<Settings, SettingsError> {
        self.store.remove(&[keys::SETTINGS]).await?;
        info!("global settings reset to defaults");
        Ok(Settings::default())
    }

    /// Falls back to the pre-rename flag, then to off.
    async fn get_focus_mode(&self) -> bool {
        let values = match self
            .store
            .get(&[keys::FOCUS_MODE, keys::LEGACY_ADHD_MODE])
            .await
        {
            Ok(values) => values,
            Err(_) => return false,
        };
        if let Some(Value::Bool(enabled)) = values.get(keys::FOCUS_MODE) {
            return *enabled;
        }
        matches!(values.get(keys::LEGACY_ADHD_MODE), Some(Value::Bool(true)))
    }

    async fn set_focus_mode(&self, enabled: bool) -> Result<(), SettingsError> {
        self.store
            .set_one(keys::FOCUS_MODE, Value::Bool(enabled))
            .await?;
        self.store.remove(&[keys::LEGACY_ADHD_MODE]).await?;
        info!(enabled, "focus mode changed");
        Ok(())
    }

    async fn get_domain_settings(&self) -> BTreeMap<String, Settings> {
        let resolver = self.resolver().await;
        self.raw_domain_table()
            .await
            .iter()
            .map(|(domain, raw)| (domain.to_lowercase(), resolver.normalize(raw)))
            .collect()
    }

    async fn get_domain_settings_for(&self, domain: &str) -> Option<Settings> {
        let key = domain_key(domain).ok()?;
        let table = self.raw_domain_table().await;
        let raw = table.get(&key).filter(|raw| !raw.is_null())?;
        Some(self.resolver().await.normalize(raw))
    }

    async fn set_domain_settings(&self, domain: &str, raw: &Value) -> Result<Settings, SettingsError> {
        let key = domain_key(domain)?;
        let settings = self.resolver().await.normalize(raw);
        let mut table = self.raw_domain_table().await;
        table.insert(key.clone(), settings.to_raw());
        self.store
            .set_one(keys::DOMAIN_SETTINGS, Value::Object(table))
            .await?;
        debug!(domain = %key, "domain settings saved");
        Ok(settings)
    }

    async fn clear_domain_settings(&self, domain: &str) -> Result<bool, SettingsError> {
        let key = domain_key(domain)?;
        let mut table = self.raw_domain_table().await;
        if table.remove(&key).is_none() {
            return Ok(false);
        }
        self.store
            .set_one(keys::DOMAIN_SETTINGS, Value::Object(table))
            .await?;
        debug!(domain = %key, "domain settings cleared");
        Ok(true)
    }

    /// Global settings with the domain's record layered on top, when it has one.
    async fn effective_settings_for(&self, domain: Option<&str>) -> Settings {
        let global = self.raw_settings().await;
        let resolver = self.resolver().await;
        let key = domain.and_then(|d| domain_key(d).ok());
        let domain_raw = match key {
            Some(key) => self.raw_domain_table().await.remove(&key),
            None => None,
        };
        resolver.resolve_effective_settings(&global, domain_raw.as_ref())
    }
}

//! Per-tab controller for DocsFocus.
//!
//! Owns one tab's state explicitly: what the settings resolve to, whether
//! the site is eligible, and whether the page features are running. Storage
//! change notifications and inbound messages are applied here, and every
//! transition funnels through [`TabController::apply_activation`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::feature_manager::FeatureModule;
use super::override_manager::{web_domain, OverrideManagerTrait};
use crate::services::docs_detector::DocsDetectorTrait;
use crate::services::html_snapshot::DomContext;
use crate::services::preset_store::custom_presets_from_raw;
use crate::services::settings_resolver::{truthy, SettingsResolver};
use crate::services::settings_store::SettingsStoreTrait;
use crate::storage::{keys, StorageChange};
use crate::types::message::{Message, MessageResponse, StateSnapshot};
use crate::types::override_entry::ManualOverrides;
use crate::types::settings::Settings;

pub struct TabController {
    url: String,
    domain: Option<String>,
    focus_mode: bool,
    settings: Settings,
    global_settings: Settings,
    domain_settings: Option<Settings>,
    manual_overrides: ManualOverrides,
    auto_detected: bool,
    site_eligible: bool,
    features_active: bool,
    resolver: SettingsResolver,
    features: Box<dyn FeatureModule>,
}

impl TabController {
    /// A tab with default state. Nothing runs until [`TabController::bootstrap`].
    pub fn new(
        url: &str,
        features: Box<dyn FeatureModule>,
        detector: &dyn DocsDetectorTrait,
        dom: Option<&dyn DomContext>,
    ) -> Self {
        let domain = web_domain(url);
        // Only web pages are candidates for automatic activation.
        let auto_detected = domain.is_some() && detector.is_documentation(url, dom);
        Self {
            url: url.to_string(),
            domain,
            focus_mode: false,
            settings: Settings::default(),
            global_settings: Settings::default(),
            domain_settings: None,
            manual_overrides: ManualOverrides::default(),
            auto_detected,
            site_eligible: false,
            features_active: false,
            resolver: SettingsResolver::default(),
            features,
        }
    }

    /// Loads focus mode, settings and overrides, then applies activation.
    pub async fn bootstrap(
        &mut self,
        settings_store: &dyn SettingsStoreTrait,
        overrides: &dyn OverrideManagerTrait,
    ) {
        self.resolver = settings_store.resolver().await;
        self.focus_mode = settings_store.get_focus_mode().await;
        self.global_settings = settings_store.get_settings().await;
        self.domain_settings = match &self.domain {
            Some(domain) => settings_store.get_domain_settings_for(domain).await,
            None => None,
        };
        self.manual_overrides = overrides.get_manual_overrides().await;
        self.refresh_settings();
        self.site_eligible = self.evaluate_eligibility();
        debug!(url = %self.url, eligible = self.site_eligible, "tab bootstrapped");
        self.apply_activation();
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn features_active(&self) -> bool {
        self.features_active
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            focus_mode: self.focus_mode,
            settings: self.settings.clone(),
            global_settings: self.global_settings.clone(),
            domain_settings: self.domain_settings.clone(),
            manual_overrides: self.manual_overrides.clone(),
            site_eligible: self.site_eligible,
            features_active: self.features_active,
            domain: self.domain.clone(),
            auto_detected: self.auto_detected,
            url: self.url.clone(),
        }
    }

    /// A manual decision for this domain wins over detection.
    fn evaluate_eligibility(&self) -> bool {
        self.domain
            .as_deref()
            .and_then(|domain| self.manual_overrides.decision(domain))
            .unwrap_or(self.auto_detected)
    }

    fn refresh_settings(&mut self) {
        let domain_raw = self.domain_settings.as_ref().map(Settings::to_raw);
        self.settings = self
            .resolver
            .resolve_effective_settings(&self.global_settings.to_raw(), domain_raw.as_ref());
    }

    /// Features run iff focus mode is on and the site is eligible.
    pub fn apply_activation(&mut self) {
        let should_activate = self.focus_mode && self.site_eligible;
        if should_activate {
            if self.features_active {
                self.features.update(&self.settings);
            } else {
                self.features.activate(&self.settings);
                self.features_active = true;
                info!(url = %self.url, preset = %self.settings.preset, "features activated");
            }
        } else if self.features_active {
            self.features.deactivate();
            self.features_active = false;
            info!(url = %self.url, "features deactivated");
        }
    }

    /// Applies a change notification. Changes from non-persistent areas are ignored.
    pub fn handle_storage_change(&mut self, change: &StorageChange) {
        if !change.area.is_persistent() {
            return;
        }
        let mut touched = false;

        if let Some(custom) = change.get(keys::CUSTOM_PRESETS) {
            let presets = custom_presets_from_raw(custom.new_value.as_ref());
            self.resolver = SettingsResolver::new(self.resolver.catalog().clone().with_custom(presets));
            // Preset tags may name a preset that no longer exists.
            self.global_settings = self.resolver.normalize(&self.global_settings.to_raw());
            self.domain_settings = self
                .domain_settings
                .as_ref()
                .map(|settings| self.resolver.normalize(&settings.to_raw()));
            touched = true;
        }
        if let Some(focus) = change.get(keys::FOCUS_MODE) {
            self.focus_mode = focus.new_value.as_ref().map(truthy).unwrap_or(false);
            touched = true;
        }
        if let Some(legacy) = change.get(keys::LEGACY_ADHD_MODE) {
            // Removal of the retired flag carries no intent.
            if let Some(value) = &legacy.new_value {
                self.focus_mode = truthy(value);
                touched = true;
            }
        }
        if let Some(global) = change.get(keys::SETTINGS) {
            let raw = global.new_value.clone().unwrap_or(Value::Null);
            self.global_settings = self.resolver.normalize(&raw);
            touched = true;
        }
        if let Some(table) = change.get(keys::DOMAIN_SETTINGS) {
            self.domain_settings = match (&self.domain, &table.new_value) {
                (Some(domain), Some(Value::Object(map))) => map
                    .get(domain)
                    .filter(|raw| !raw.is_null())
                    .map(|raw| self.resolver.normalize(raw)),
                _ => None,
            };
            touched = true;
        }
        if let Some(overrides) = change.get(keys::MANUAL_OVERRIDES) {
            self.manual_overrides = ManualOverrides::from_raw(overrides.new_value.as_ref());
            self.site_eligible = self.evaluate_eligibility();
            touched = true;
        }

        if touched {
            self.refresh_settings();
            self.apply_activation();
        }
    }

    /// Validates and dispatches a raw message. Invalid input yields an error reply.
    pub fn handle_raw_message(&mut self, raw: &Value) -> MessageResponse {
        match Message::from_value(raw) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                warn!(error = %e, "rejected tab message");
                MessageResponse::error(e.to_string())
            }
        }
    }

    pub fn handle_message(&mut self, message: Message) -> MessageResponse {
        debug!(kind = message.kind(), url = %self.url, "tab message");
        match message {
            Message::GetState => {}
            Message::RequestSettings => {
                return MessageResponse::with_settings(self.settings.clone());
            }
            Message::ToggleFocus { enabled } => {
                self.focus_mode = enabled;
                self.apply_activation();
            }
            Message::SettingsUpdated { settings } => {
                self.global_settings = self.resolver.normalize(&settings);
                self.refresh_settings();
                self.apply_activation();
            }
            Message::DomainSettings { domain, settings } => {
                if self.domain.as_deref() == Some(domain.as_str()) {
                    self.domain_settings = settings.map(|raw| self.resolver.normalize(&raw));
                    self.refresh_settings();
                    self.apply_activation();
                }
            }
            Message::ManualOverride { domain, enabled, .. } => {
                if self.domain.as_deref() == Some(domain.as_str()) {
                    match enabled {
                        Some(enabled) => self.manual_overrides.set(&domain, enabled, now_ms()),
                        None => {
                            self.manual_overrides.remove(&domain);
                        }
                    }
                    self.site_eligible = self.evaluate_eligibility();
                    self.apply_activation();
                }
            }
        }
        MessageResponse::with_state(self.snapshot())
    }

    /// Stops the features, if running. Used when the tab goes away.
    pub fn shutdown(&mut self) {
        if self.features_active {
            self.features.deactivate();
            self.features_active = false;
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

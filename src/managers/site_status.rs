//! Site status as shown by the popup.
//!
//! Derives, for one URL, whether DocsFocus applies, why, which preset is in
//! effect, and what the per-site button should offer.

use serde::{Deserialize, Serialize};

use super::override_manager::web_domain;
use crate::services::docs_detector::DocsDetectorTrait;
use crate::services::html_snapshot::DomContext;
use crate::types::detection::DocsMatch;
use crate::types::override_entry::ManualOverrides;
use crate::types::preset::preset_label;
use crate::types::settings::Settings;

pub const MANUAL_ALLOW_MESSAGE: &str = "Manually enabled for this domain.";
pub const MANUAL_BLOCK_MESSAGE: &str = "Manually disabled for this domain.";
pub const NOT_DETECTED_MESSAGE: &str = "DocsFocus did not detect documentation signals.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilitySource {
    ManualAllow,
    ManualBlock,
    Auto,
    NotDetected,
}

/// What the per-site button does when pressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SiteAction {
    Enable,
    Disable,
    Clear,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteButton {
    pub action: SiteAction,
    pub label: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub url: String,
    pub domain: Option<String>,
    pub focus_mode: bool,
    pub site_eligible: bool,
    pub features_active: bool,
    pub auto_detected: bool,
    pub eligibility_source: EligibilitySource,
    pub eligibility_message: String,
    pub headline: String,
    pub preset_display: String,
    pub settings: Settings,
    pub detection: Option<DocsMatch>,
    /// Absent when the URL has no web domain.
    pub button: Option<SiteButton>,
}

/// Inputs gathered from storage for one status computation.
pub struct StatusInputs<'a> {
    pub url: &'a str,
    pub focus_mode: bool,
    pub overrides: &'a ManualOverrides,
    pub global_settings: &'a Settings,
    pub domain_settings: Option<&'a Settings>,
    /// Effective settings for the domain.
    pub settings: &'a Settings,
}

pub fn derive_site_status(
    inputs: StatusInputs<'_>,
    detector: &dyn DocsDetectorTrait,
    dom: Option<&dyn DomContext>,
) -> SiteStatus {
    let domain = web_domain(inputs.url);
    let detection = domain.as_ref().map(|_| detector.describe(inputs.url, dom));
    let auto_detected = detection.as_ref().map(|d| d.matched).unwrap_or(false);
    let decision = domain
        .as_deref()
        .and_then(|d| inputs.overrides.decision(d));

    let (eligible, source, message) = match decision {
        Some(true) => (true, EligibilitySource::ManualAllow, MANUAL_ALLOW_MESSAGE.to_string()),
        Some(false) => (false, EligibilitySource::ManualBlock, MANUAL_BLOCK_MESSAGE.to_string()),
        None if auto_detected => (
            true,
            EligibilitySource::Auto,
            detection.as_ref().map(|d| d.label.clone()).unwrap_or_default(),
        ),
        None => (
            false,
            EligibilitySource::NotDetected,
            detection
                .as_ref()
                .map(|d| d.label.clone())
                .unwrap_or_else(|| NOT_DETECTED_MESSAGE.to_string()),
        ),
    };

    let features_active = inputs.focus_mode && eligible;
    let headline = if !eligible {
        if decision == Some(false) || auto_detected {
            "DocsFocus is disabled for this domain."
        } else {
            "DocsFocus is idle: page not detected as documentation."
        }
    } else if !inputs.focus_mode {
        "Focus Mode is OFF. Enable to apply focus helpers."
    } else {
        "DocsFocus is active on this page."
    };

    let button = domain
        .as_ref()
        .map(|_| site_button(auto_detected, decision));

    SiteStatus {
        url: inputs.url.to_string(),
        domain,
        focus_mode: inputs.focus_mode,
        site_eligible: eligible,
        features_active,
        auto_detected,
        eligibility_source: source,
        eligibility_message: message,
        headline: headline.to_string(),
        preset_display: preset_display(inputs.global_settings, inputs.domain_settings),
        settings: inputs.settings.clone(),
        detection,
        button,
    }
}

/// `"Preset: <label>"`, marked `(global)` when the domain has no settings of its own.
pub fn preset_display(global: &Settings, domain: Option<&Settings>) -> String {
    match domain {
        Some(domain) => format!("Preset: {}", preset_label(&domain.preset)),
        None => format!("Preset: {} (global)", preset_label(&global.preset)),
    }
}

fn site_button(auto_detected: bool, decision: Option<bool>) -> SiteButton {
    let (action, label, hint) = match (auto_detected, decision) {
        (true, Some(false)) => (
            SiteAction::Clear,
            "Re-enable on this domain",
            "Previously disabled. Re-enable to restore automatic enhancements.",
        ),
        (true, _) => (
            SiteAction::Disable,
            "Disable on this domain",
            "This site is automatically recognized as documentation.",
        ),
        (false, Some(true)) => (
            SiteAction::Clear,
            "Disable manual enable",
            "This site is manually enabled for DocsFocus.",
        ),
        (false, _) => (
            SiteAction::Enable,
            "Enable on this domain",
            "Enable DocsFocus manually for this non-documentation site.",
        ),
    };
    SiteButton {
        action,
        label: label.to_string(),
        hint: hint.to_string(),
    }
}

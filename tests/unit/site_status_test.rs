//! Unit tests for popup site status derivation.

use rstest::rstest;

use docsfocus::managers::site_status::{
    derive_site_status, preset_display, EligibilitySource, SiteAction, SiteStatus, StatusInputs,
    MANUAL_ALLOW_MESSAGE, MANUAL_BLOCK_MESSAGE, NOT_DETECTED_MESSAGE,
};
use docsfocus::services::docs_detector::DocsDetector;
use docsfocus::types::override_entry::ManualOverrides;
use docsfocus::types::settings::Settings;

const DOCS_URL: &str = "https://docs.rs/tokio";
const BLOG_URL: &str = "https://blog.example.com/post";

fn status(url: &str, focus_mode: bool, overrides: &ManualOverrides) -> SiteStatus {
    let settings = Settings::default();
    derive_site_status(
        StatusInputs {
            url,
            focus_mode,
            overrides,
            global_settings: &settings,
            domain_settings: None,
            settings: &settings,
        },
        &DocsDetector::new(),
        None,
    )
}

fn with_override(domain: &str, enabled: bool) -> ManualOverrides {
    let mut overrides = ManualOverrides::default();
    overrides.set(domain, enabled, 1);
    overrides
}

#[test]
fn test_detected_docs_with_focus_on_is_active() {
    let status = status(DOCS_URL, true, &ManualOverrides::default());
    assert!(status.site_eligible);
    assert!(status.features_active);
    assert_eq!(status.eligibility_source, EligibilitySource::Auto);
    assert_eq!(status.eligibility_message, "Matched a known documentation site.");
    assert_eq!(status.headline, "DocsFocus is active on this page.");
    let button = status.button.unwrap();
    assert_eq!(button.action, SiteAction::Disable);
    assert_eq!(button.label, "Disable on this domain");
}

#[test]
fn test_detected_docs_with_focus_off() {
    let status = status(DOCS_URL, false, &ManualOverrides::default());
    assert!(status.site_eligible);
    assert!(!status.features_active);
    assert_eq!(status.headline, "Focus Mode is OFF. Enable to apply focus helpers.");
}

#[test]
fn test_blocked_docs_site() {
    let status = status(DOCS_URL, true, &with_override("docs.rs", false));
    assert!(!status.site_eligible);
    assert!(status.auto_detected);
    assert_eq!(status.eligibility_source, EligibilitySource::ManualBlock);
    assert_eq!(status.eligibility_message, MANUAL_BLOCK_MESSAGE);
    assert_eq!(status.headline, "DocsFocus is disabled for this domain.");
    assert_eq!(status.button.unwrap().action, SiteAction::Clear);
}

#[test]
fn test_undetected_site() {
    let status = status(BLOG_URL, true, &ManualOverrides::default());
    assert!(!status.site_eligible);
    assert_eq!(status.eligibility_source, EligibilitySource::NotDetected);
    assert_eq!(status.eligibility_message, "No documentation signals detected.");
    assert_eq!(
        status.headline,
        "DocsFocus is idle: page not detected as documentation."
    );
    let button = status.button.unwrap();
    assert_eq!(button.action, SiteAction::Enable);
    assert_eq!(button.label, "Enable on this domain");
}

#[test]
fn test_manually_enabled_site() {
    let status = status(BLOG_URL, true, &with_override("blog.example.com", true));
    assert!(status.features_active);
    assert_eq!(status.eligibility_source, EligibilitySource::ManualAllow);
    assert_eq!(status.eligibility_message, MANUAL_ALLOW_MESSAGE);
    let button = status.button.unwrap();
    assert_eq!(button.action, SiteAction::Clear);
    assert_eq!(button.label, "Disable manual enable");
}

#[test]
fn test_manual_block_on_undetected_site() {
    let status = status(BLOG_URL, true, &with_override("blog.example.com", false));
    assert_eq!(status.headline, "DocsFocus is disabled for this domain.");
    assert_eq!(status.button.unwrap().action, SiteAction::Enable);
}

#[rstest]
#[case("chrome://extensions")]
#[case("about:blank")]
#[case("not a url")]
fn test_non_web_pages_have_no_domain_or_button(#[case] url: &str) {
    let status = status(url, true, &ManualOverrides::default());
    assert_eq!(status.domain, None);
    assert_eq!(status.detection, None);
    assert_eq!(status.button, None);
    assert_eq!(status.eligibility_message, NOT_DETECTED_MESSAGE);
    assert!(!status.features_active);
}

#[test]
fn test_status_serializes_camel_case() {
    let status = status(DOCS_URL, true, &ManualOverrides::default());
    let raw = serde_json::to_value(&status).unwrap();
    assert_eq!(raw["eligibilitySource"], "auto");
    assert_eq!(raw["featuresActive"], true);
    assert_eq!(raw["presetDisplay"], "Preset: Deep Focus (global)");
    assert_eq!(raw["detection"]["reason"], "pattern");
}

#[test]
fn test_preset_display_prefers_domain_settings() {
    let global = Settings::default();
    let mut domain = Settings::default();
    domain.preset = "skim".to_string();
    assert_eq!(preset_display(&global, Some(&domain)), "Preset: Skim (fast scan)");

    let mut global = Settings::default();
    global.preset = "Evening".to_string();
    assert_eq!(preset_display(&global, None), "Preset: Evening (global)");
}

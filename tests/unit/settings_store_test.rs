//! Unit tests for persisted global settings, focus mode and per-domain settings.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use docsfocus::services::settings_store::{SettingsStore, SettingsStoreTrait};
use docsfocus::storage::{keys, FallbackStore};
use docsfocus::types::errors::SettingsError;
use docsfocus::types::settings::Settings;

fn setup() -> (SettingsStore, Arc<FallbackStore>) {
    let store = Arc::new(FallbackStore::ephemeral());
    (SettingsStore::new(store.clone()), store)
}

// ─── Global settings ───

#[tokio::test]
async fn test_get_settings_defaults_when_empty() {
    let (settings, _) = setup();
    assert_eq!(settings.get_settings().await, Settings::default());
}

#[tokio::test]
async fn test_set_settings_normalizes_before_storing() {
    let (settings, store) = setup();
    let saved = settings
        .set_settings(&json!({"collapseThreshold": 50, "keywords": ["a", "a"]}))
        .await
        .unwrap();
    assert_eq!(saved.collapse_threshold, 120);
    assert_eq!(saved.keywords, vec!["a"]);

    let stored = store.get_lenient(keys::SETTINGS).await.unwrap();
    assert_eq!(stored["collapseThreshold"], 120);
    assert_eq!(stored["preset"], "custom");
}

#[tokio::test]
async fn test_malformed_stored_settings_read_as_normalized() {
    let (settings, store) = setup();
    store
        .set_one(keys::SETTINGS, json!({"collapseThreshold": "abc", "trimChrome": 0}))
        .await
        .unwrap();
    let read = settings.get_settings().await;
    assert_eq!(read.collapse_threshold, 400);
    assert!(!read.trim_chrome);
}

#[tokio::test]
async fn test_reset_settings_removes_stored_blob() {
    let (settings, store) = setup();
    settings.set_settings(&json!({"collapseThreshold": 999})).await.unwrap();
    let reset = settings.reset_settings().await.unwrap();
    assert_eq!(reset, Settings::default());
    assert!(store.get_lenient(keys::SETTINGS).await.is_none());
    assert_eq!(settings.get_settings().await, Settings::default());
}

// ─── Focus mode ───

#[tokio::test]
async fn test_focus_mode_defaults_off() {
    let (settings, _) = setup();
    assert!(!settings.get_focus_mode().await);
}

#[tokio::test]
async fn test_focus_mode_reads_legacy_flag() {
    let (settings, store) = setup();
    store.set_one(keys::LEGACY_ADHD_MODE, json!(true)).await.unwrap();
    assert!(settings.get_focus_mode().await);
}

#[tokio::test]
async fn test_focus_mode_key_wins_over_legacy_flag() {
    let (settings, store) = setup();
    store.set_one(keys::LEGACY_ADHD_MODE, json!(true)).await.unwrap();
    store.set_one(keys::FOCUS_MODE, json!(false)).await.unwrap();
    assert!(!settings.get_focus_mode().await);
}

#[tokio::test]
async fn test_set_focus_mode_retires_legacy_flag() {
    let (settings, store) = setup();
    store.set_one(keys::LEGACY_ADHD_MODE, json!(true)).await.unwrap();
    settings.set_focus_mode(true).await.unwrap();
    assert_eq!(store.get_lenient(keys::FOCUS_MODE).await, Some(json!(true)));
    assert!(store.get_lenient(keys::LEGACY_ADHD_MODE).await.is_none());
}

// ─── Per-domain settings ───

#[tokio::test]
async fn test_domain_settings_are_keyed_lowercase() {
    let (settings, _) = setup();
    settings
        .set_domain_settings(" Docs.Example.com ", &json!({"collapseThreshold": 900}))
        .await
        .unwrap();
    let read = settings.get_domain_settings_for("docs.example.com").await.unwrap();
    assert_eq!(read.collapse_threshold, 900);
    let table = settings.get_domain_settings().await;
    assert_eq!(table.keys().collect::<Vec<_>>(), vec!["docs.example.com"]);
}

#[tokio::test]
async fn test_blank_domain_is_rejected() {
    let (settings, _) = setup();
    let err = settings.set_domain_settings("  ", &json!({})).await.unwrap_err();
    assert!(matches!(err, SettingsError::InvalidDomain(_)));
    assert!(settings.get_domain_settings_for("").await.is_none());
}

#[tokio::test]
async fn test_clear_domain_settings() {
    let (settings, _) = setup();
    settings
        .set_domain_settings("a.example.com", &json!({"trimChrome": false}))
        .await
        .unwrap();
    settings
        .set_domain_settings("b.example.com", &json!({"trimChrome": false}))
        .await
        .unwrap();

    assert!(settings.clear_domain_settings("a.example.com").await.unwrap());
    assert!(!settings.clear_domain_settings("a.example.com").await.unwrap());
    assert!(settings.get_domain_settings_for("a.example.com").await.is_none());
    assert!(settings.get_domain_settings_for("b.example.com").await.is_some());
}

#[tokio::test]
async fn test_effective_settings_layer_domain_over_global() {
    let (settings, _) = setup();
    settings
        .set_settings(&json!({"collapseThreshold": 300, "readingMask": false}))
        .await
        .unwrap();
    settings
        .set_domain_settings("docs.example.com", &json!({"collapseThreshold": 1200}))
        .await
        .unwrap();

    let effective = settings.effective_settings_for(Some("docs.example.com")).await;
    // The domain record was stored fully normalized, so its mask toggle is the default.
    assert_eq!(effective.collapse_threshold, 1200);
    assert!(effective.reading_mask);

    let other = settings.effective_settings_for(Some("other.example.com")).await;
    assert_eq!(other.collapse_threshold, 300);
    assert!(!other.reading_mask);

    assert_eq!(settings.effective_settings_for(None).await, settings.get_settings().await);
}

#[tokio::test]
async fn test_custom_presets_take_part_in_tagging() {
    let (settings, store) = setup();
    store
        .set_one(keys::CUSTOM_PRESETS, json!({"Evening": {"collapseThreshold": 800}}))
        .await
        .unwrap();
    let saved = settings.set_settings(&json!({"collapseThreshold": 800})).await.unwrap();
    assert_eq!(saved.preset, "Evening");
}

#[tokio::test]
async fn test_settings_persist_in_sqlite_store() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("docsfocus.db");
    {
        let settings = SettingsStore::new(Arc::new(FallbackStore::open(&path).unwrap()));
        settings.set_settings(&json!({"collapseThreshold": 640})).await.unwrap();
    }
    let settings = SettingsStore::new(Arc::new(FallbackStore::open(&path).unwrap()));
    assert_eq!(settings.get_settings().await.collapse_threshold, 640);
}

//! Unit tests for custom preset CRUD, visibility and application.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use docsfocus::services::preset_store::{custom_presets_from_raw, PresetStore, PresetStoreTrait};
use docsfocus::services::settings_store::{SettingsStore, SettingsStoreTrait};
use docsfocus::storage::{keys, FallbackStore};
use docsfocus::types::errors::PresetError;
use docsfocus::types::settings::Settings;

fn setup() -> (PresetStore, SettingsStore, Arc<FallbackStore>) {
    let store = Arc::new(FallbackStore::ephemeral());
    (
        PresetStore::new(store.clone()),
        SettingsStore::new(store.clone()),
        store,
    )
}

// ─── Save ───

#[tokio::test]
async fn test_save_and_list_custom_preset() {
    let (presets, _, _) = setup();
    let name = presets
        .save_custom_preset("  Evening  ", &json!({"collapseThreshold": 800}))
        .await
        .unwrap();
    assert_eq!(name, "Evening");

    let stored = presets.get_custom_presets().await;
    assert_eq!(stored["Evening"]["collapseThreshold"], 800);
    assert!(stored["Evening"].get("preset").is_none());
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn test_save_rejects_empty_name(#[case] name: &str) {
    let (presets, _, _) = setup();
    let err = presets.save_custom_preset(name, &json!({})).await.unwrap_err();
    assert!(matches!(err, PresetError::EmptyName));
}

#[rstest]
#[case("deepfocus")]
#[case("Skim")]
#[case("CUSTOM")]
#[case("adhd")]
#[tokio::test]
async fn test_save_rejects_reserved_names(#[case] name: &str) {
    let (presets, _, _) = setup();
    let err = presets.save_custom_preset(name, &json!({})).await.unwrap_err();
    assert!(matches!(err, PresetError::ReservedName(_)));
}

#[tokio::test]
async fn test_save_rejects_duplicate_ignoring_case() {
    let (presets, _, _) = setup();
    presets.save_custom_preset("Evening", &json!({})).await.unwrap();
    let err = presets.save_custom_preset("evening", &json!({})).await.unwrap_err();
    assert!(matches!(err, PresetError::DuplicateName(_)));
}

#[tokio::test]
async fn test_malformed_entries_are_skipped_on_read() {
    let presets = custom_presets_from_raw(Some(&json!({"ok": {"collapseThreshold": 300}, "bad": 3})));
    assert_eq!(presets.len(), 1);
    assert!(presets.contains_key("ok"));
    assert!(custom_presets_from_raw(Some(&json!("oops"))).is_empty());
}

// ─── Delete ───

#[tokio::test]
async fn test_delete_missing_preset_returns_false() {
    let (presets, _, _) = setup();
    assert!(!presets.delete_custom_preset("ghost").await.unwrap());
}

#[tokio::test]
async fn test_delete_inactive_preset_keeps_settings() {
    let (presets, settings, _) = setup();
    presets
        .save_custom_preset("Evening", &json!({"collapseThreshold": 800}))
        .await
        .unwrap();
    settings.set_settings(&json!({"collapseThreshold": 300})).await.unwrap();

    assert!(presets.delete_custom_preset("Evening").await.unwrap());
    assert!(presets.get_custom_presets().await.is_empty());
    assert_eq!(settings.get_settings().await.collapse_threshold, 300);
}

#[tokio::test]
async fn test_delete_active_preset_resets_global_settings() {
    let (presets, settings, store) = setup();
    presets
        .save_custom_preset("Evening", &json!({"collapseThreshold": 800, "keywords": ["x"]}))
        .await
        .unwrap();
    let applied = presets
        .apply_preset("Evening", &Settings::default().to_raw())
        .await;
    settings.set_settings(&applied.to_raw()).await.unwrap();
    assert_eq!(settings.get_settings().await.preset, "Evening");

    presets.delete_custom_preset("Evening").await.unwrap();
    let stored = store.get_lenient(keys::SETTINGS).await.unwrap();
    assert_eq!(stored["preset"], "deepfocus");
    assert_eq!(settings.get_settings().await, Settings::default());
}

// ─── Visibility ───

#[tokio::test]
async fn test_hidden_builtin_left_out_of_picker() {
    let (presets, _, _) = setup();
    presets.save_custom_preset("Evening", &json!({})).await.unwrap();
    assert_eq!(
        presets.list_selectable_presets().await,
        vec!["deepfocus", "skim", "Evening", "custom"]
    );

    let visibility = presets.set_preset_visibility("skim", false).await.unwrap();
    assert!(!visibility.is_visible("skim"));
    assert_eq!(
        presets.list_selectable_presets().await,
        vec!["deepfocus", "Evening", "custom"]
    );
}

#[tokio::test]
async fn test_visibility_only_for_builtins() {
    let (presets, _, _) = setup();
    let err = presets.set_preset_visibility("Evening", false).await.unwrap_err();
    assert!(matches!(err, PresetError::UnknownBuiltin(_)));
    assert!(presets.get_preset_visibility().await.is_visible("deepfocus"));
}

// ─── Apply ───

#[tokio::test]
async fn test_apply_builtin_over_base() {
    let (presets, _, _) = setup();
    let applied = presets
        .apply_preset("skim", &json!({"keywords": ["serde"]}))
        .await;
    assert_eq!(applied.preset, "skim");
    assert_eq!(applied.keywords, vec!["serde"]);
    assert!(!applied.highlight_in_code);
}

#[tokio::test]
async fn test_apply_custom_preset_restores_saved_keywords() {
    let (presets, _, _) = setup();
    presets
        .save_custom_preset("Rusty", &json!({"keywords": ["impl", "trait"], "collapseThreshold": 500}))
        .await
        .unwrap();
    let applied = presets
        .apply_preset("Rusty", &Settings::default().to_raw())
        .await;
    assert_eq!(applied.preset, "Rusty");
    assert_eq!(applied.keywords, vec!["impl", "trait"]);
    assert_eq!(applied.collapse_threshold, 500);
}

//! RPC method handler for the DocsFocus JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! appropriate managers and services via the `App` struct.

use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::managers::override_manager::{origin_patterns, OverrideManagerTrait};
use crate::services::docs_detector::DocsDetectorTrait;
use crate::services::html_snapshot::{DomContext, HtmlSnapshot};
use crate::services::preset_store::PresetStoreTrait;
use crate::services::settings_store::SettingsStoreTrait;
use crate::types::settings::Settings;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn bool_param(params: &Value, key: &str) -> Result<bool, String> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| format!("missing {}", key))
}

fn tab_param(params: &Value) -> Result<i64, String> {
    params
        .get("tabId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| "missing tabId".to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// Pending storage notifications are delivered to open tabs before returning.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    debug!(method, "rpc call");
    let result = dispatch(app, method, params).await;
    app.sync_tabs().await;
    result
}

async fn dispatch(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Settings ───
        "settings.get" => to_json(&app.settings_store.get_settings().await),
        "settings.set" => {
            let raw = params.get("settings").ok_or("missing settings")?;
            let saved = app.settings_store.set_settings(raw).await.map_err(|e| e.to_string())?;
            to_json(&saved)
        }
        "settings.reset" => {
            let defaults = app.settings_store.reset_settings().await.map_err(|e| e.to_string())?;
            to_json(&defaults)
        }
        "settings.normalize" => {
            let raw = params.get("settings").unwrap_or(&Value::Null);
            let resolver = app.settings_store.resolver().await;
            to_json(&resolver.normalize(raw))
        }
        "settings.merge" => {
            let base = params.get("base").unwrap_or(&Value::Null);
            let overlay = params.get("override").unwrap_or(&Value::Null);
            let resolver = app.settings_store.resolver().await;
            to_json(&resolver.merge_settings(base, overlay))
        }
        "settings.effective" => {
            let domain = params.get("domain").and_then(|v| v.as_str());
            to_json(&app.settings_store.effective_settings_for(domain).await)
        }
        "focus.get" => Ok(json!({"enabled": app.settings_store.get_focus_mode().await})),
        "focus.set" => {
            let enabled = bool_param(params, "enabled")?;
            app.settings_store.set_focus_mode(enabled).await.map_err(|e| e.to_string())?;
            Ok(json!({"enabled": enabled}))
        }

        // ─── Per-domain settings ───
        "domain.list" => to_json(&app.settings_store.get_domain_settings().await),
        "domain.get" => {
            let domain = str_param(params, "domain")?;
            to_json(&app.settings_store.get_domain_settings_for(domain).await)
        }
        "domain.set" => {
            let domain = str_param(params, "domain")?;
            let raw = params.get("settings").ok_or("missing settings")?;
            let saved = app
                .settings_store
                .set_domain_settings(domain, raw)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&saved)
        }
        "domain.clear" => {
            let domain = str_param(params, "domain")?;
            let removed = app
                .settings_store
                .clear_domain_settings(domain)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed}))
        }

        // ─── Presets ───
        "preset.list" => Ok(json!(app.preset_store.list_selectable_presets().await)),
        "preset.custom" => to_json(&app.preset_store.get_custom_presets().await),
        "preset.save" => {
            let name = str_param(params, "name")?;
            let snapshot = match params.get("settings") {
                Some(raw) => raw.clone(),
                None => app.settings_store.get_settings().await.to_raw(),
            };
            let saved = app
                .preset_store
                .save_custom_preset(name, &snapshot)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"name": saved}))
        }
        "preset.delete" => {
            let name = str_param(params, "name")?;
            let removed = app
                .preset_store
                .delete_custom_preset(name)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed}))
        }
        "preset.apply" => {
            let name = str_param(params, "name")?;
            let domain = params.get("domain").and_then(|v| v.as_str());
            let base: Settings = app.settings_store.effective_settings_for(domain).await;
            let applied = app.preset_store.apply_preset(name, &base.to_raw()).await;
            let saved = match domain {
                Some(domain) => app.settings_store.set_domain_settings(domain, &applied.to_raw()).await,
                None => app.settings_store.set_settings(&applied.to_raw()).await,
            }
            .map_err(|e| e.to_string())?;
            to_json(&saved)
        }
        "preset.visibility.get" => to_json(&app.preset_store.get_preset_visibility().await),
        "preset.visibility.set" => {
            let name = str_param(params, "name")?;
            let visible = bool_param(params, "visible")?;
            let visibility = app
                .preset_store
                .set_preset_visibility(name, visible)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&visibility)
        }

        // ─── Manual overrides ───
        "override.list" => to_json(&app.override_manager.get_manual_overrides().await),
        "override.set" => {
            let domain = str_param(params, "domain")?;
            let enabled = match params.get("enabled") {
                None | Some(Value::Null) => None,
                Some(Value::Bool(flag)) => Some(*flag),
                Some(_) => return Err("enabled must be a boolean or null".to_string()),
            };
            let overrides = app
                .override_manager
                .update_manual_override(domain, enabled)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&overrides)
        }
        "override.message" => {
            let message = params.get("message").ok_or("missing message")?;
            to_json(&app.handle_override_message(message).await)
        }
        "permission.contains" => {
            let domain = str_param(params, "domain")?;
            Ok(json!({"granted": app.override_manager.has_host_permission(domain).await}))
        }
        "permission.request" => {
            let domain = str_param(params, "domain")?;
            Ok(json!({"granted": app.override_manager.request_host_permission(domain).await}))
        }
        "permission.revoke" => {
            let domain = str_param(params, "domain")?;
            Ok(json!({"removed": app.override_manager.revoke_host_permission(domain).await}))
        }
        "permission.list" => Ok(json!(app.override_manager.granted_domains().await)),
        "override.shouldInject" => {
            let url = str_param(params, "url")?;
            Ok(json!({"inject": app.override_manager.should_inject(url).await}))
        }
        "override.origins" => {
            let domain = str_param(params, "domain")?;
            Ok(json!(origin_patterns(domain)))
        }

        // ─── Detection ───
        "detect.analyze" | "detect.describe" => {
            let url = str_param(params, "url")?;
            let snapshot = params
                .get("html")
                .and_then(|v| v.as_str())
                .map(HtmlSnapshot::parse);
            let dom = snapshot.as_ref().map(|s| s as &dyn DomContext);
            if method == "detect.analyze" {
                to_json(&app.detector.analyze(url, dom))
            } else {
                to_json(&app.detector.describe(url, dom))
            }
        }
        "site.status" => {
            let url = str_param(params, "url")?;
            let html = params.get("html").and_then(|v| v.as_str());
            to_json(&app.site_status(url, html).await)
        }

        // ─── Tabs ───
        "tab.open" => {
            let url = str_param(params, "url")?;
            let html = params.get("html").and_then(|v| v.as_str());
            let (id, state) = app.open_tab(url, html).await;
            Ok(json!({"tabId": id, "state": to_json(&state)?}))
        }
        "tab.list" => Ok(json!(app.tab_ids().await)),
        "tab.state" => {
            let id = tab_param(params)?;
            let state = app.tab_state(id).await.ok_or("unknown tab")?;
            to_json(&state)
        }
        "tab.message" => {
            let id = tab_param(params)?;
            let message = params.get("message").ok_or("missing message")?;
            let response = app.tab_message(id, message).await.ok_or("unknown tab")?;
            to_json(&response)
        }
        "tab.close" => {
            let id = tab_param(params)?;
            Ok(json!({"closed": app.close_tab(id).await}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}

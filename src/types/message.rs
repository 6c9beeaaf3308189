//! Messages exchanged between the popup, the background worker, and tabs.
//!
//! Inbound payloads are validated once, here, into a closed [`Message`] enum;
//! handlers never inspect raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::MessageError;
use super::override_entry::ManualOverrides;
use super::settings::Settings;

pub const GET_STATE: &str = "docsfocus:getState";
pub const TOGGLE_FOCUS: &str = "docsfocus:toggleFocus";
/// Retired name of [`TOGGLE_FOCUS`], still accepted on input.
pub const TOGGLE_ADHD: &str = "docsfocus:toggleAdhd";
pub const SETTINGS_UPDATED: &str = "docsfocus:settingsUpdated";
pub const DOMAIN_SETTINGS: &str = "docsfocus:domainSettings";
pub const MANUAL_OVERRIDE: &str = "docsfocus:manualOverride";
pub const REQUEST_SETTINGS: &str = "docsfocus:requestSettings";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    GetState,
    ToggleFocus {
        enabled: bool,
    },
    /// New global settings in raw form; the receiver normalizes.
    SettingsUpdated {
        settings: Value,
    },
    /// Per-domain settings changed; `None` clears them.
    DomainSettings {
        domain: String,
        settings: Option<Value>,
    },
    /// Manual enable/disable for a domain; `enabled: None` clears the override.
    ManualOverride {
        domain: String,
        enabled: Option<bool>,
        tab_id: Option<i64>,
        skip_permission_check: bool,
    },
    RequestSettings,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::GetState => GET_STATE,
            Message::ToggleFocus { .. } => TOGGLE_FOCUS,
            Message::SettingsUpdated { .. } => SETTINGS_UPDATED,
            Message::DomainSettings { .. } => DOMAIN_SETTINGS,
            Message::ManualOverride { .. } => MANUAL_OVERRIDE,
            Message::RequestSettings => REQUEST_SETTINGS,
        }
    }

    /// Validates a raw `{type, payload}` object.
    pub fn from_value(raw: &Value) -> Result<Self, MessageError> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| MessageError::Malformed("missing string `type`".to_string()))?;
        let payload = raw.get("payload").unwrap_or(&Value::Null);

        match kind {
            GET_STATE => Ok(Message::GetState),
            REQUEST_SETTINGS => Ok(Message::RequestSettings),
            TOGGLE_FOCUS | TOGGLE_ADHD => {
                let enabled = payload
                    .get("enabled")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| invalid(kind, "`enabled` must be a boolean"))?;
                Ok(Message::ToggleFocus { enabled })
            }
            SETTINGS_UPDATED => {
                // The settings object is the payload itself.
                if !payload.is_object() {
                    return Err(invalid(kind, "payload must be a settings object"));
                }
                Ok(Message::SettingsUpdated {
                    settings: payload.clone(),
                })
            }
            DOMAIN_SETTINGS => {
                let domain = required_domain(kind, payload)?;
                let settings = match payload.get("settings") {
                    None | Some(Value::Null) => None,
                    Some(value @ Value::Object(_)) => Some(value.clone()),
                    Some(_) => return Err(invalid(kind, "`settings` must be an object or null")),
                };
                Ok(Message::DomainSettings { domain, settings })
            }
            MANUAL_OVERRIDE => {
                let domain = required_domain(kind, payload)?;
                let enabled = match payload.get("enabled") {
                    None | Some(Value::Null) => None,
                    Some(Value::Bool(flag)) => Some(*flag),
                    Some(_) => return Err(invalid(kind, "`enabled` must be a boolean or null")),
                };
                let tab_id = payload.get("tabId").and_then(Value::as_i64);
                let skip_permission_check = payload
                    .get("skipPermissionCheck")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(Message::ManualOverride {
                    domain,
                    enabled,
                    tab_id,
                    skip_permission_check,
                })
            }
            other => Err(MessageError::UnknownType(other.to_string())),
        }
    }

    /// Wire form, the inverse of [`Message::from_value`].
    pub fn to_value(&self) -> Value {
        let payload = match self {
            Message::GetState | Message::RequestSettings => Value::Null,
            Message::ToggleFocus { enabled } => json!({ "enabled": enabled }),
            Message::SettingsUpdated { settings } => settings.clone(),
            Message::DomainSettings { domain, settings } => {
                json!({ "domain": domain, "settings": settings })
            }
            Message::ManualOverride {
                domain,
                enabled,
                tab_id,
                skip_permission_check,
            } => json!({
                "domain": domain,
                "enabled": enabled,
                "tabId": tab_id,
                "skipPermissionCheck": skip_permission_check,
            }),
        };
        json!({ "type": self.kind(), "payload": payload })
    }
}

fn invalid(kind: &str, reason: &str) -> MessageError {
    MessageError::InvalidPayload {
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

fn required_domain(kind: &str, payload: &Value) -> Result<String, MessageError> {
    payload
        .get("domain")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| invalid(kind, "missing domain"))
}

/// Tab state as reported to the popup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub focus_mode: bool,
    pub settings: Settings,
    pub global_settings: Settings,
    pub domain_settings: Option<Settings>,
    pub manual_overrides: ManualOverrides,
    pub site_eligible: bool,
    pub features_active: bool,
    pub domain: Option<String>,
    pub auto_detected: bool,
    pub url: String,
}

/// Reply to any message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// The stored override table, after a background override update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ManualOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn with_state(state: StateSnapshot) -> Self {
        Self {
            ok: true,
            state: Some(state),
            settings: None,
            overrides: None,
            error: None,
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            ok: true,
            state: None,
            settings: Some(settings),
            overrides: None,
            error: None,
        }
    }

    pub fn with_overrides(overrides: ManualOverrides, state: Option<StateSnapshot>) -> Self {
        Self {
            ok: true,
            state,
            settings: None,
            overrides: Some(overrides),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            state: None,
            settings: None,
            overrides: None,
            error: Some(message.into()),
        }
    }
}

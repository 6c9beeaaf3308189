//! Key/value storage areas and the fallback chain over them.
//!
//! Settings, overrides and presets live in a browser-style key/value store with
//! two persistence tiers (`sync`, `local`). Every area implements
//! [`StorageArea`]; [`FallbackStore`] tries them in order and publishes change
//! notifications for the persistent tiers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::errors::StorageError;

pub mod fallback;
pub mod memory;
pub mod sqlite;

pub use fallback::FallbackStore;
pub use memory::MemoryArea;
pub use sqlite::SqliteArea;

/// Storage keys shared by every execution context.
pub mod keys {
    pub const SETTINGS: &str = "docsfocusSettings";
    pub const MANUAL_OVERRIDES: &str = "docsfocusManualOverrides";
    pub const DOMAIN_SETTINGS: &str = "docsfocusDomainSettings";
    pub const CUSTOM_PRESETS: &str = "docsfocusCustomPresets";
    pub const PRESET_VISIBILITY: &str = "docsfocusPresetVisibility";
    pub const FOCUS_MODE: &str = "docsfocusFocusMode";
    /// Boolean flag written by older releases before focus mode was renamed.
    pub const LEGACY_ADHD_MODE: &str = "docsfocusAdhdMode";
}

/// Which tier an area belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaName {
    Sync,
    Local,
    /// Best-effort in-process bridge; never announces changes.
    Memory,
}

impl AreaName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaName::Sync => "sync",
            AreaName::Local => "local",
            AreaName::Memory => "memory",
        }
    }

    /// Only the two persistence tiers take part in change notification.
    pub fn is_persistent(&self) -> bool {
        matches!(self, AreaName::Sync | AreaName::Local)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sync" => Some(AreaName::Sync),
            "local" => Some(AreaName::Local),
            "memory" => Some(AreaName::Memory),
            _ => None,
        }
    }
}

/// Old and new value of one key. `None` means absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// One change notification: the keys that changed and the area they changed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    pub area: AreaName,
    pub changes: BTreeMap<String, ValueChange>,
}

impl StorageChange {
    pub fn get(&self, key: &str) -> Option<&ValueChange> {
        self.changes.get(key)
    }

    pub fn touches(&self, key: &str) -> bool {
        self.changes.contains_key(key)
    }
}

/// A single key/value area. Every operation is fallible.
#[async_trait]
pub trait StorageArea: Send + Sync {
    fn name(&self) -> AreaName;

    /// Returns the present keys among `keys`; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError>;

    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}

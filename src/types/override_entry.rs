use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Forced enable/disable decision for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualOverride {
    pub enabled: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Manual overrides keyed by lowercase hostname.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ManualOverrides(pub BTreeMap<String, ManualOverride>);

impl ManualOverrides {
    /// Lenient read of the stored table. Entries without a boolean `enabled`
    /// are dropped; a missing timestamp reads as zero.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let mut table = BTreeMap::new();
        if let Some(Value::Object(map)) = raw {
            for (domain, entry) in map {
                let Some(enabled) = entry.get("enabled").and_then(Value::as_bool) else {
                    continue;
                };
                let timestamp = entry.get("timestamp").and_then(Value::as_i64).unwrap_or(0);
                table.insert(domain.to_lowercase(), ManualOverride { enabled, timestamp });
            }
        }
        Self(table)
    }

    pub fn get(&self, domain: &str) -> Option<&ManualOverride> {
        self.0.get(&domain.to_lowercase())
    }

    /// The forced decision for a domain, if any.
    pub fn decision(&self, domain: &str) -> Option<bool> {
        self.get(domain).map(|entry| entry.enabled)
    }

    pub fn set(&mut self, domain: &str, enabled: bool, timestamp: i64) {
        self.0
            .insert(domain.to_lowercase(), ManualOverride { enabled, timestamp });
    }

    pub fn remove(&mut self, domain: &str) -> bool {
        self.0.remove(&domain.to_lowercase()).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{AreaName, StorageArea};
use crate::types::errors::StorageError;

/// In-process area. Used as the last link of the fallback chain and in tests.
pub struct MemoryArea {
    name: AreaName,
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryArea {
    pub fn new(name: AreaName) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The last-resort bridge area.
    pub fn bridge() -> Self {
        Self::new(AreaName::Memory)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("memory area poisoned: {}", e)))
    }
}

#[async_trait]
impl StorageArea for MemoryArea {
    fn name(&self) -> AreaName {
        self.name
    }

    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        let entries = self.lock()?;
        let mut result = Map::new();
        for key in keys {
            if let Some(value) = entries.get(*key) {
                result.insert(key.to_string(), value.clone());
            }
        }
        Ok(result)
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        for (key, value) in values {
            entries.insert(key, value);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

//! Ordered fallback over storage areas.
//!
//! Each operation goes to the first area; on failure it is retried against the
//! next one, down to the in-memory bridge. Successful writes to a persistent
//! tier are announced on a broadcast channel so other contexts can refresh.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{AreaName, MemoryArea, SqliteArea, StorageArea, StorageChange, ValueChange};
use crate::database::Database;
use crate::types::errors::StorageError;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct FallbackStore {
    chain: Vec<Arc<dyn StorageArea>>,
    changes: broadcast::Sender<StorageChange>,
}

impl FallbackStore {
    /// Builds a store over `chain`, tried in order.
    pub fn new(chain: Vec<Arc<dyn StorageArea>>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { chain, changes }
    }

    /// `sync` and `local` areas in one SQLite file, then the in-memory bridge.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Arc::new(Mutex::new(Database::open(path)?));
        Ok(Self::over_database(db))
    }

    /// Same chain as [`FallbackStore::open`] over an in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = Arc::new(Mutex::new(Database::open_in_memory()?));
        Ok(Self::over_database(db))
    }

    /// A single in-memory `sync` area. Handy for tests and throwaway contexts.
    pub fn ephemeral() -> Self {
        Self::new(vec![Arc::new(MemoryArea::new(AreaName::Sync))])
    }

    fn over_database(db: Arc<Mutex<Database>>) -> Self {
        Self::new(vec![
            Arc::new(SqliteArea::new(db.clone(), AreaName::Sync)),
            Arc::new(SqliteArea::new(db, AreaName::Local)),
            Arc::new(MemoryArea::bridge()),
        ])
    }

    /// Receives every change written to a persistent tier from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    pub async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        let mut last_error = None;
        for area in &self.chain {
            match area.get(keys).await {
                Ok(values) => return Ok(values),
                Err(e) => {
                    warn!(area = area.name().as_str(), error = %e, "storage read failed, falling back");
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted(last_error))
    }

    /// Reads one key, treating any storage failure as absence.
    pub async fn get_lenient(&self, key: &str) -> Option<Value> {
        match self.get(&[key]).await {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!(key, error = %e, "storage unavailable, using defaults");
                None
            }
        }
    }

    pub async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError> {
        let keys: Vec<String> = values.keys().cloned().collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let mut last_error = None;
        for area in &self.chain {
            let previous = area.get(&key_refs).await.unwrap_or_default();
            match area.set(values.clone()).await {
                Ok(()) => {
                    let changes = values
                        .iter()
                        .map(|(key, value)| {
                            let change = ValueChange {
                                old_value: previous.get(key).cloned(),
                                new_value: Some(value.clone()),
                            };
                            (key.clone(), change)
                        })
                        .collect();
                    self.announce(area.name(), changes);
                    return Ok(());
                }
                Err(e) => {
                    warn!(area = area.name().as_str(), error = %e, "storage write failed, falling back");
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted(last_error))
    }

    /// Writes a single key.
    pub async fn set_one(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut values = Map::new();
        values.insert(key.to_string(), value);
        self.set(values).await
    }

    pub async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut last_error = None;
        for area in &self.chain {
            let previous = area.get(keys).await.unwrap_or_default();
            match area.remove(keys).await {
                Ok(()) => {
                    let changes = previous
                        .into_iter()
                        .map(|(key, old)| {
                            let change = ValueChange {
                                old_value: Some(old),
                                new_value: None,
                            };
                            (key, change)
                        })
                        .collect();
                    self.announce(area.name(), changes);
                    return Ok(());
                }
                Err(e) => {
                    warn!(area = area.name().as_str(), error = %e, "storage remove failed, falling back");
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted(last_error))
    }

    fn announce(&self, area: AreaName, changes: BTreeMap<String, ValueChange>) {
        if !area.is_persistent() || changes.is_empty() {
            return;
        }
        let keys: Vec<&String> = changes.keys().collect();
        debug!(area = area.as_str(), ?keys, "storage changed");
        // No subscribers is not an error.
        let _ = self.changes.send(StorageChange { area, changes });
    }
}

fn exhausted(last_error: Option<StorageError>) -> StorageError {
    match last_error {
        Some(e) => StorageError::Exhausted(e.to_string()),
        None => StorageError::Unavailable("no storage areas configured".to_string()),
    }
}

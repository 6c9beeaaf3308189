//! SQLite-backed storage area.
//!
//! Both persistence tiers can share one database; each area only sees the rows
//! tagged with its own name.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};

use super::{AreaName, StorageArea};
use crate::database::Database;
use crate::types::errors::StorageError;

pub struct SqliteArea {
    db: Arc<Mutex<Database>>,
    name: AreaName,
}

impl SqliteArea {
    pub fn new(db: Arc<Mutex<Database>>, name: AreaName) -> Self {
        Self { db, name }
    }

    fn now_ts() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn with_db<T>(
        &self,
        op: impl FnOnce(&Database) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let guard = self
            .db
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("database lock poisoned: {}", e)))?;
        op(&guard)
    }
}

#[async_trait]
impl StorageArea for SqliteArea {
    fn name(&self) -> AreaName {
        self.name
    }

    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        let area = self.name.as_str();
        self.with_db(|db| {
            let conn = db.connection();
            let mut stmt =
                conn.prepare("SELECT value FROM kv_entries WHERE area = ?1 AND key = ?2")?;
            let mut result = Map::new();
            for key in keys {
                let raw: Option<String> = stmt
                    .query_row(params![area, key], |row| row.get(0))
                    .optional()?;
                if let Some(raw) = raw {
                    // Rows written by hand may hold bare strings.
                    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                    result.insert(key.to_string(), value);
                }
            }
            Ok(result)
        })
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError> {
        let area = self.name.as_str();
        let now = Self::now_ts();
        self.with_db(|db| {
            let tx = db.connection().unchecked_transaction()?;
            for (key, value) in &values {
                let encoded = serde_json::to_string(value)?;
                tx.execute(
                    "INSERT INTO kv_entries (area, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(area, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![area, key, encoded, now],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let area = self.name.as_str();
        self.with_db(|db| {
            let tx = db.connection().unchecked_transaction()?;
            for key in keys {
                tx.execute(
                    "DELETE FROM kv_entries WHERE area = ?1 AND key = ?2",
                    params![area, key],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

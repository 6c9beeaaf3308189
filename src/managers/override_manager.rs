//! Manual Override Manager for DocsFocus.
//!
//! Manages per-domain forced enable/disable decisions, independent of both
//! detection and per-domain settings, and the injection decision derived
//! from them.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::storage::{keys, FallbackStore};
use crate::types::errors::StorageError;
use crate::types::override_entry::ManualOverrides;

/// Trait defining manual override operations.
#[async_trait]
pub trait OverrideManagerTrait: Send + Sync {
    async fn get_manual_overrides(&self) -> ManualOverrides;
    async fn update_manual_override(&self, domain: &str, enabled: Option<bool>) -> Result<ManualOverrides, StorageError>;
    async fn should_inject(&self, url: &str) -> bool;
}

/// Reply text when enabling a domain the host has not granted.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission denied for this domain.";

/// Host-permission match patterns covering one domain.
pub fn origin_patterns(domain: &str) -> Vec<String> {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return Vec::new();
    }
    vec![format!("https://{domain}/*"), format!("http://{domain}/*")]
}

/// Lowercase hostname of an http(s) URL; `None` for anything else.
pub fn web_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_lowercase)
}

/// Manual override table backed by the shared key/value store.
///
/// Host permissions are granted per process and never persisted; the
/// embedding browser owns the real grants.
pub struct OverrideManager {
    store: Arc<FallbackStore>,
    granted: Mutex<BTreeSet<String>>,
}

impl OverrideManager {
    pub fn new(store: Arc<FallbackStore>) -> Self {
        Self {
            store,
            granted: Mutex::new(BTreeSet::new()),
        }
    }

    pub async fn has_host_permission(&self, domain: &str) -> bool {
        self.granted.lock().await.contains(&domain.trim().to_lowercase())
    }

    /// Grants the origins of `domain`. Returns false for a blank domain.
    pub async fn request_host_permission(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return false;
        }
        info!(domain = %domain, origins = ?origin_patterns(&domain), "host permission granted");
        self.granted.lock().await.insert(domain);
        true
    }

    pub async fn revoke_host_permission(&self, domain: &str) -> bool {
        self.granted.lock().await.remove(&domain.trim().to_lowercase())
    }

    pub async fn granted_domains(&self) -> Vec<String> {
        self.granted.lock().await.iter().cloned().collect()
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

#[async_trait]
impl OverrideManagerTrait for OverrideManager {
    async fn get_manual_overrides(&self) -> ManualOverrides {
        let raw = self.store.get_lenient(keys::MANUAL_OVERRIDES).await;
        ManualOverrides::from_raw(raw.as_ref())
    }

    /// `None` clears the entry. A blank domain changes nothing.
    async fn update_manual_override(&self, domain: &str, enabled: Option<bool>) -> Result<ManualOverrides, StorageError> {
        let mut overrides = self.get_manual_overrides().await;
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            debug!("ignoring manual override without a domain");
            return Ok(overrides);
        }

        match enabled {
            Some(enabled) => overrides.set(&domain, enabled, Self::now_ms()),
            None => {
                overrides.remove(&domain);
            }
        }
        self.store
            .set_one(keys::MANUAL_OVERRIDES, overrides.to_raw())
            .await?;
        info!(domain = %domain, ?enabled, "manual override updated");
        Ok(overrides)
    }

    /// Only http(s) pages on a domain the user explicitly enabled.
    async fn should_inject(&self, url: &str) -> bool {
        let Some(domain) = web_domain(url) else {
            return false;
        };
        self.get_manual_overrides().await.decision(&domain) == Some(true)
    }
}

//! App Core for DocsFocus.
//!
//! Central struct holding the store, services and managers, plus the open
//! tabs. Storage change notifications are pumped into the tabs by
//! [`App::sync_tabs`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::managers::feature_manager::FeatureSet;
use crate::managers::override_manager::{
    web_domain, OverrideManager, OverrideManagerTrait, PERMISSION_DENIED_MESSAGE,
};
use crate::managers::site_status::{derive_site_status, SiteStatus, StatusInputs};
use crate::managers::tab_controller::TabController;
use crate::platform;
use crate::services::docs_detector::DocsDetector;
use crate::services::html_snapshot::{DomContext, HtmlSnapshot};
use crate::services::preset_store::PresetStore;
use crate::services::settings_store::{SettingsStore, SettingsStoreTrait};
use crate::storage::{FallbackStore, StorageChange};
use crate::types::errors::StorageError;
use crate::types::message::{Message, MessageResponse, StateSnapshot};

/// Default log filter; `RUST_LOG` replaces it.
pub const DEFAULT_LOG_FILTER: &str = "docsfocus=info";

/// Logs go to stderr; stdout is reserved for command output and RPC frames.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Where the store lives.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Explicit database file; otherwise the platform default.
    pub database_path: Option<PathBuf>,
    /// Keep everything in memory. Nothing survives the process.
    pub in_memory: bool,
}

impl AppConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(platform::default_database_path)
    }
}

/// Central application struct holding all services and open tabs.
pub struct App {
    pub store: Arc<FallbackStore>,
    pub settings_store: SettingsStore,
    pub preset_store: PresetStore,
    pub override_manager: OverrideManager,
    pub detector: DocsDetector,
    tabs: Mutex<BTreeMap<i64, TabController>>,
    changes: Mutex<broadcast::Receiver<StorageChange>>,
    next_tab_id: AtomicI64,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, StorageError> {
        let store = if config.in_memory {
            FallbackStore::open_in_memory()?
        } else {
            let path = config.database_path();
            info!(path = %path.display(), "opening settings store");
            FallbackStore::open(path)?
        };
        Ok(Self::with_store(Arc::new(store)))
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::new(&AppConfig {
            database_path: None,
            in_memory: true,
        })
    }

    pub fn with_store(store: Arc<FallbackStore>) -> Self {
        let changes = store.subscribe();
        Self {
            settings_store: SettingsStore::new(store.clone()),
            preset_store: PresetStore::new(store.clone()),
            override_manager: OverrideManager::new(store.clone()),
            detector: DocsDetector::new(),
            tabs: Mutex::new(BTreeMap::new()),
            changes: Mutex::new(changes),
            next_tab_id: AtomicI64::new(1),
            store,
        }
    }

    /// Opens a tab on `url`, optionally with the page's HTML for structural detection.
    pub async fn open_tab(&self, url: &str, html: Option<&str>) -> (i64, StateSnapshot) {
        let mut tab = {
            let snapshot = html.map(HtmlSnapshot::parse);
            let dom = snapshot.as_ref().map(|s| s as &dyn DomContext);
            TabController::new(url, Box::new(FeatureSet::standard()), &self.detector, dom)
        };
        tab.bootstrap(&self.settings_store, &self.override_manager).await;

        let id = self.next_tab_id.fetch_add(1, Ordering::Relaxed);
        let state = tab.snapshot();
        self.tabs.lock().await.insert(id, tab);
        debug!(tab = id, url, "tab opened");
        (id, state)
    }

    pub async fn close_tab(&self, id: i64) -> bool {
        match self.tabs.lock().await.remove(&id) {
            Some(mut tab) => {
                tab.shutdown();
                true
            }
            None => false,
        }
    }

    pub async fn tab_state(&self, id: i64) -> Option<StateSnapshot> {
        self.tabs.lock().await.get(&id).map(TabController::snapshot)
    }

    pub async fn tab_ids(&self) -> Vec<i64> {
        self.tabs.lock().await.keys().copied().collect()
    }

    /// Delivers a raw message to one tab. `None` when the tab does not exist.
    pub async fn tab_message(&self, id: i64, raw: &Value) -> Option<MessageResponse> {
        let mut tabs = self.tabs.lock().await;
        tabs.get_mut(&id).map(|tab| tab.handle_raw_message(raw))
    }

    /// Background handling of a `manualOverride` message.
    ///
    /// Enabling needs a host permission for the domain; it is requested unless
    /// `skipPermissionCheck` is set, in which case a missing grant is refused.
    /// The override is persisted, forwarded to `tabId` when that tab is open,
    /// and the reply carries the stored table plus that tab's state.
    pub async fn handle_override_message(&self, raw: &Value) -> MessageResponse {
        let (domain, enabled, tab_id, skip_permission_check) = match Message::from_value(raw) {
            Ok(Message::ManualOverride {
                domain,
                enabled,
                tab_id,
                skip_permission_check,
            }) => (domain, enabled, tab_id, skip_permission_check),
            Ok(other) => {
                warn!(kind = other.kind(), "not a manual override message");
                return MessageResponse::error(format!("Unexpected message type: {}", other.kind()));
            }
            Err(e) => {
                warn!(error = %e, "rejected manual override message");
                return MessageResponse::error(e.to_string());
            }
        };

        if enabled == Some(true) && !self.override_manager.has_host_permission(&domain).await {
            let granted =
                !skip_permission_check && self.override_manager.request_host_permission(&domain).await;
            if !granted {
                warn!(domain = %domain, "manual enable refused without host permission");
                return MessageResponse::error(PERMISSION_DENIED_MESSAGE);
            }
        }

        let overrides = match self
            .override_manager
            .update_manual_override(&domain, enabled)
            .await
        {
            Ok(overrides) => overrides,
            Err(e) => return MessageResponse::error(e.to_string()),
        };

        if let Some(id) = tab_id {
            let forwarded = Message::ManualOverride {
                domain,
                enabled,
                tab_id: None,
                skip_permission_check: false,
            };
            match self.tabs.lock().await.get_mut(&id) {
                Some(tab) => {
                    tab.handle_message(forwarded);
                }
                None => debug!(tab = id, "override target tab is not open"),
            }
        }
        // Reconcile tabs with the stored table before reporting state.
        self.sync_tabs().await;

        let state = match tab_id {
            Some(id) => self.tab_state(id).await,
            None => None,
        };
        MessageResponse::with_overrides(overrides, state)
    }

    /// Applies every pending storage change to every open tab.
    ///
    /// If notifications were dropped, tabs reload their state from storage instead.
    pub async fn sync_tabs(&self) -> usize {
        let mut pending = Vec::new();
        let mut lagged = false;
        {
            let mut changes = self.changes.lock().await;
            loop {
                match changes.try_recv() {
                    Ok(change) => pending.push(change),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed storage notifications, reloading tabs");
                        lagged = true;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }

        let mut tabs = self.tabs.lock().await;
        if lagged {
            for tab in tabs.values_mut() {
                tab.bootstrap(&self.settings_store, &self.override_manager).await;
            }
        } else {
            for change in &pending {
                for tab in tabs.values_mut() {
                    tab.handle_storage_change(change);
                }
            }
        }
        pending.len()
    }

    /// Popup view of one URL, computed from storage.
    pub async fn site_status(&self, url: &str, html: Option<&str>) -> SiteStatus {
        let domain = web_domain(url);
        let focus_mode = self.settings_store.get_focus_mode().await;
        let overrides = self.override_manager.get_manual_overrides().await;
        let global_settings = self.settings_store.get_settings().await;
        let domain_settings = match &domain {
            Some(domain) => self.settings_store.get_domain_settings_for(domain).await,
            None => None,
        };
        let settings = self
            .settings_store
            .effective_settings_for(domain.as_deref())
            .await;

        let snapshot = html.map(HtmlSnapshot::parse);
        let dom = snapshot.as_ref().map(|s| s as &dyn DomContext);
        derive_site_status(
            StatusInputs {
                url,
                focus_mode,
                overrides: &overrides,
                global_settings: &global_settings,
                domain_settings: domain_settings.as_ref(),
                settings: &settings,
            },
            &self.detector,
            dom,
        )
    }
}

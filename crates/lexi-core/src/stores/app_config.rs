use std::path::Path;

use anyhow::Result;
use lexi_domain::store::AppConfigState;
use serde_json::Value;

use crate::docstore::{DocStore, StoreSchema};

impl StoreSchema for AppConfigState {
    const FILE_NAME: &'static str = "app-config.json";

    fn default_state() -> Self {
        AppConfigState::default_state()
    }

    fn normalize(raw: &Value) -> Self {
        AppConfigState::normalize(raw)
    }

    fn prune(&mut self) {
        AppConfigState::prune(self);
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn set_updated_at(&mut self, ts: String) {
        self.updated_at = ts;
    }
}

/// Flat key-value overrides for runtime application settings.
pub struct AppConfigStore {
    store: DocStore<AppConfigState>,
}

impl AppConfigStore {
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        AppConfigStore {
            store: DocStore::open(dir),
        }
    }

    /// # Errors
    ///
    /// Surfaces persistence failures; corrupt files are repaired silently.
    pub fn snapshot(&self) -> Result<AppConfigState> {
        self.store.snapshot()
    }

    /// Sets an override; `None` removes it.
    ///
    /// # Errors
    ///
    /// Fails only on persistence failures.
    pub fn set_override(&self, key: &str, value: Option<String>) -> Result<AppConfigState> {
        self.store.mutate(|state| {
            state.set(key, value.clone());
            Ok(())
        })
    }
}

//! Application configuration overrides.
//!
//! A flat string map; typed readers live next to the keys that need them so
//! an unknown or mistyped override degrades to its default instead of
//! wedging the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{timestamp_or_epoch, EPOCH};

pub const APP_CONFIG_SCHEMA_VERSION: u32 = 1;

pub const KEY_DEFAULT_LANGUAGE: &str = "defaultLanguage";
pub const KEY_MAINTENANCE_BANNER: &str = "maintenanceBanner";
pub const KEY_MAX_DAILY_SUBMISSIONS: &str = "maxDailySubmissions";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigState {
    pub schema_version: u32,
    pub updated_at: String,
    pub overrides: BTreeMap<String, String>,
}

impl AppConfigState {
    #[must_use]
    pub fn default_state() -> Self {
        AppConfigState {
            schema_version: APP_CONFIG_SCHEMA_VERSION,
            updated_at: EPOCH.to_string(),
            overrides: BTreeMap::new(),
        }
    }

    /// Keeps only string-valued overrides with non-empty keys.
    #[must_use]
    pub fn normalize(raw: &Value) -> Self {
        let mut state = AppConfigState::default_state();
        state.updated_at = timestamp_or_epoch(raw, "updatedAt");
        if let Some(map) = raw.get("overrides").and_then(Value::as_object) {
            for (key, value) in map {
                if key.trim().is_empty() {
                    continue;
                }
                if let Some(text) = value.as_str() {
                    state.overrides.insert(key.clone(), text.to_string());
                }
            }
        }
        state
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// `None` removes the override.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.overrides.insert(key.to_string(), value);
            }
            None => {
                self.overrides.remove(key);
            }
        }
    }

    #[must_use]
    pub fn max_daily_submissions(&self) -> Option<u32> {
        self.get(KEY_MAX_DAILY_SUBMISSIONS)?.parse().ok()
    }

    pub fn prune(&mut self) {
        // Bounded by the closed key set in practice; nothing to evict.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_keeps_only_string_values() {
        let raw = json!({
            "updatedAt": "2026-03-01T00:00:00Z",
            "overrides": {
                "defaultLanguage": "en",
                "maxDailySubmissions": "5",
                "broken": 17,
                "": "empty-key"
            }
        });
        let state = AppConfigState::normalize(&raw);
        assert_eq!(state.get(KEY_DEFAULT_LANGUAGE), Some("en"));
        assert_eq!(state.max_daily_submissions(), Some(5));
        assert_eq!(state.overrides.len(), 2);
    }

    #[test]
    fn set_none_removes() {
        let mut state = AppConfigState::default_state();
        state.set(KEY_MAINTENANCE_BANNER, Some("down at noon".to_string()));
        assert!(state.get(KEY_MAINTENANCE_BANNER).is_some());
        state.set(KEY_MAINTENANCE_BANNER, None);
        assert!(state.get(KEY_MAINTENANCE_BANNER).is_none());
    }

    #[test]
    fn round_trip_is_identity() {
        let raw = json!({"overrides": {"a": "1", "b": "2"}});
        let state = AppConfigState::normalize(&raw);
        let back = AppConfigState::normalize(&serde_json::to_value(&state).unwrap());
        assert_eq!(back, state);
    }
}

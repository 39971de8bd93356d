//! Language registry snapshot: which languages are live and which
//! dictionary file backs each of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_safe_relative_path, timestamp_or_epoch, EPOCH};
use crate::variant::Variant;

pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// Default secret-word length when an entry does not carry one.
pub const DEFAULT_MIN_LENGTH: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSource {
    /// Shipped with the deployment; always present, never removable.
    Baked,
    /// Imported through the provider pipeline.
    Provider,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRef {
    pub provider_id: String,
    pub variant: Variant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub id: String,
    pub label: String,
    pub enabled: bool,
    pub source: LanguageSource,
    pub min_length: u8,
    pub has_dictionary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    pub schema_version: u32,
    pub updated_at: String,
    pub languages: Vec<LanguageEntry>,
}

/// The build ships exactly these; a valid snapshot always contains them.
#[must_use]
pub fn baked_languages() -> Vec<LanguageEntry> {
    vec![LanguageEntry {
        id: "en".to_string(),
        label: "English".to_string(),
        enabled: true,
        source: LanguageSource::Baked,
        min_length: DEFAULT_MIN_LENGTH,
        has_dictionary: true,
        dictionary_file: Some("baked/en.txt".to_string()),
        provider: None,
    }]
}

impl RegistryState {
    #[must_use]
    pub fn default_state() -> Self {
        RegistryState {
            schema_version: REGISTRY_SCHEMA_VERSION,
            updated_at: EPOCH.to_string(),
            languages: baked_languages(),
        }
    }

    /// Rebuilds a valid registry from untrusted JSON.
    ///
    /// Baked entries are re-seeded from the build (only their `enabled`
    /// flag is taken from disk), provider entries must carry a known
    /// variant and a safe dictionary path or they are dropped, and
    /// `has_dictionary` is recomputed rather than trusted.
    #[must_use]
    pub fn normalize(raw: &Value) -> Self {
        let mut state = RegistryState::default_state();
        state.updated_at = timestamp_or_epoch(raw, "updatedAt");
        let disk: Vec<LanguageEntry> = raw
            .get("languages")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        for baked in &mut state.languages {
            if let Some(stored) = disk
                .iter()
                .find(|e| e.source == LanguageSource::Baked && e.id == baked.id)
            {
                baked.enabled = stored.enabled;
            }
        }

        for entry in disk {
            if entry.source != LanguageSource::Provider {
                continue;
            }
            let Some(provider) = entry.provider.clone() else {
                continue;
            };
            if entry.id != provider.variant.as_str() {
                continue;
            }
            let dictionary_file = entry
                .dictionary_file
                .filter(|path| is_safe_relative_path(path));
            let Some(dictionary_file) = dictionary_file else {
                // A provider entry without a dictionary cannot serve games.
                continue;
            };
            if state.languages.iter().any(|e| e.id == entry.id) {
                continue;
            }
            state.languages.push(LanguageEntry {
                id: entry.id,
                label: entry.label,
                enabled: entry.enabled,
                source: LanguageSource::Provider,
                min_length: clamp_min_length(entry.min_length),
                has_dictionary: true,
                dictionary_file: Some(dictionary_file),
                provider: Some(provider),
            });
        }

        state.sort();
        state
    }

    fn sort(&mut self) {
        self.languages.sort_by(|a, b| a.id.cmp(&b.id));
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&LanguageEntry> {
        self.languages.iter().find(|e| e.id == id)
    }

    /// Inserts or replaces the provider entry for `variant`, enabled.
    pub fn upsert_provider(
        &mut self,
        variant: Variant,
        provider_id: &str,
        dictionary_file: String,
        min_length: u8,
    ) {
        let entry = LanguageEntry {
            id: variant.as_str().to_string(),
            label: variant.label().to_string(),
            enabled: true,
            source: LanguageSource::Provider,
            min_length: clamp_min_length(min_length),
            has_dictionary: true,
            dictionary_file: Some(dictionary_file),
            provider: Some(ProviderRef {
                provider_id: provider_id.to_string(),
                variant,
            }),
        };
        match self.languages.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.languages.push(entry),
        }
        self.sort();
    }

    /// Flips an entry to disabled. Idempotent; artifacts and the entry
    /// itself are retained. Returns false for unknown ids.
    pub fn disable(&mut self, id: &str) -> bool {
        match self.languages.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.enabled = false;
                true
            }
            None => false,
        }
    }

    /// Ids of languages currently serving traffic.
    #[must_use]
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.id.as_str())
            .collect()
    }

    pub fn prune(&mut self) {
        // The closed variant set bounds the registry; nothing to evict.
    }
}

fn clamp_min_length(value: u8) -> u8 {
    let min = crate::words::MIN_WORD_LEN as u8;
    let max = crate::words::MAX_WORD_LEN as u8;
    if value < min || value > max {
        DEFAULT_MIN_LENGTH
    } else {
        value
    }
}

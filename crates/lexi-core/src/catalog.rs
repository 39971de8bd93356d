//! Read-optimized catalog of the languages currently serving games.
//!
//! Readers take an `Arc` of an immutable snapshot and keep it for the
//! whole request, so a registry change mid-request can never tear what
//! they see. Each rebuild bumps a generation counter; two snapshots with
//! the same generation are the same snapshot.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use lexi_domain::store::{LanguageSource, RegistryState};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLanguage {
    pub id: String,
    pub label: String,
    pub source: LanguageSource,
    pub min_length: u8,
    /// Absolute path of the word list backing this language.
    pub dictionary_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub languages: Vec<CatalogLanguage>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn language(&self, id: &str) -> Option<&CatalogLanguage> {
        self.languages.iter().find(|l| l.id == id)
    }
}

pub struct Catalog {
    data_dir: PathBuf,
    current: Mutex<Arc<CatalogSnapshot>>,
}

impl Catalog {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Catalog {
            data_dir: data_dir.to_path_buf(),
            current: Mutex::new(Arc::new(CatalogSnapshot {
                generation: 0,
                languages: Vec::new(),
            })),
        }
    }

    /// The latest published snapshot. Cheap; clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.lock())
    }

    /// Rebuilds from a registry state and publishes atomically.
    ///
    /// Only enabled entries that actually carry a dictionary make it in;
    /// everything else is invisible to readers.
    pub fn publish(&self, registry: &RegistryState) -> Arc<CatalogSnapshot> {
        let languages: Vec<CatalogLanguage> = registry
            .languages
            .iter()
            .filter(|e| e.enabled && e.has_dictionary)
            .filter_map(|e| {
                let file = e.dictionary_file.as_ref()?;
                Some(CatalogLanguage {
                    id: e.id.clone(),
                    label: e.label.clone(),
                    source: e.source,
                    min_length: e.min_length,
                    dictionary_path: self.data_dir.join(file),
                })
            })
            .collect();

        let mut guard = self.lock();
        let next = Arc::new(CatalogSnapshot {
            generation: guard.generation + 1,
            languages,
        });
        debug!(
            generation = next.generation,
            languages = next.languages.len(),
            "published catalog snapshot"
        );
        *guard = Arc::clone(&next);
        next
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<CatalogSnapshot>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use lexi_domain::store::languages::DEFAULT_MIN_LENGTH;
    use lexi_domain::Variant;

    use super::*;

    fn registry_with_provider() -> RegistryState {
        let mut state = RegistryState::default_state();
        state.upsert_provider(
            Variant::EnUs,
            "wooorm-dictionaries",
            "providers/en-US/x/guess-pool.txt".to_string(),
            DEFAULT_MIN_LENGTH,
        );
        state
    }

    #[test]
    fn publish_exposes_only_enabled_languages_with_dictionaries() {
        let catalog = Catalog::new(Path::new("/data"));
        let mut registry = registry_with_provider();
        registry.disable("en");

        let snap = catalog.publish(&registry);
        assert_eq!(snap.languages.len(), 1);
        let lang = snap.language("en-US").unwrap();
        assert_eq!(
            lang.dictionary_path,
            Path::new("/data/providers/en-US/x/guess-pool.txt")
        );
        assert!(snap.language("en").is_none());
    }

    #[test]
    fn generation_increases_with_every_publish() {
        let catalog = Catalog::new(Path::new("/data"));
        assert_eq!(catalog.snapshot().generation, 0);
        let registry = registry_with_provider();
        assert_eq!(catalog.publish(&registry).generation, 1);
        assert_eq!(catalog.publish(&registry).generation, 2);
    }

    #[test]
    fn held_snapshot_is_unaffected_by_later_publishes() {
        let catalog = Catalog::new(Path::new("/data"));
        let registry = registry_with_provider();
        let held = catalog.publish(&registry);

        let mut changed = registry.clone();
        changed.disable("en-US");
        catalog.publish(&changed);

        assert!(held.language("en-US").is_some());
        assert!(catalog.snapshot().language("en-US").is_none());
    }
}

//! Language registry: the document store that decides which languages are
//! live and which pipeline artifacts back them.
//!
//! Activation is the only bridge from the provider pipeline into serving:
//! it re-checks the commit directory's artifacts at the moment of the
//! switch and refuses to point the registry at anything incomplete.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use lexi_domain::parse_word_list;
use lexi_domain::store::languages::DEFAULT_MIN_LENGTH;
use lexi_domain::store::{LanguageEntry, RegistryState};
use lexi_domain::{CommitId, Variant};
use serde_json::Value;
use tracing::info;

use crate::docstore::{DocStore, StoreSchema};
use crate::pipeline::fetch::PROVIDER_ID;
use crate::pipeline::paths::{CommitDir, ANSWER_POOL, ANSWER_POOL_ACTIVE, GUESS_POOL};
use crate::pipeline::PipelineError;

impl StoreSchema for RegistryState {
    const FILE_NAME: &'static str = "languages.json";

    fn default_state() -> Self {
        RegistryState::default_state()
    }

    fn normalize(raw: &Value) -> Self {
        RegistryState::normalize(raw)
    }

    fn prune(&mut self) {
        RegistryState::prune(self);
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn set_updated_at(&mut self, ts: String) {
        self.updated_at = ts;
    }
}

pub struct RegistryStore {
    data_dir: PathBuf,
    store: DocStore<RegistryState>,
}

impl RegistryStore {
    #[must_use]
    pub fn open(data_dir: &Path) -> Self {
        RegistryStore {
            data_dir: data_dir.to_path_buf(),
            store: DocStore::open(data_dir),
        }
    }

    /// # Errors
    ///
    /// Surfaces persistence failures; corrupt files are repaired silently.
    pub fn snapshot(&self) -> Result<RegistryState> {
        self.store.snapshot()
    }

    /// Activates `variant` backed by the artifacts under `commit`.
    ///
    /// Both pools are re-validated against the filesystem first; a missing
    /// or empty artifact leaves the registry exactly as it was. An absent
    /// active answer pool falls back to the pre-filter one, so `enable` is
    /// re-runnable after a crash between stages. Re-enabling with a
    /// different commit atomically repoints the entry.
    ///
    /// # Errors
    ///
    /// `ACTIVATION_INCOMPLETE` when any required artifact is missing or
    /// empty; persistence failures otherwise.
    pub fn enable(
        &self,
        variant: Variant,
        commit: &CommitId,
        min_length: Option<u8>,
    ) -> Result<LanguageEntry> {
        let paths = CommitDir::new(&self.data_dir, variant, commit.clone());
        match pool_len(&paths, GUESS_POOL)? {
            None => return Err(self.incomplete(&paths, format!("missing {GUESS_POOL}"))),
            Some(0) => return Err(self.incomplete(&paths, format!("{GUESS_POOL} is empty"))),
            Some(_) => {}
        }
        let (answer_file, answers) = match pool_len(&paths, ANSWER_POOL_ACTIVE)? {
            Some(count) => (ANSWER_POOL_ACTIVE, count),
            None => match pool_len(&paths, ANSWER_POOL)? {
                Some(count) => (ANSWER_POOL, count),
                None => {
                    return Err(self.incomplete(&paths, format!("missing {ANSWER_POOL_ACTIVE}")))
                }
            },
        };
        if answers == 0 {
            return Err(self.incomplete(&paths, format!("{answer_file} is empty")));
        }

        let dictionary_file = paths.relative_file(GUESS_POOL);
        let min_length = min_length.unwrap_or(DEFAULT_MIN_LENGTH);
        let state = self.store.mutate(|state| {
            state.upsert_provider(variant, PROVIDER_ID, dictionary_file.clone(), min_length);
            Ok(())
        })?;

        info!(variant = %variant, commit = %commit, "language enabled");
        let entry = state
            .entry(variant.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("entry for '{variant}' vanished after enable"))?;
        Ok(entry)
    }

    /// Disables a language without touching its artifacts. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails for unknown language ids and on persistence failures.
    pub fn disable(&self, id: &str) -> Result<RegistryState> {
        let state = self.store.mutate(|state| {
            if !state.disable(id) {
                anyhow::bail!("unknown language '{id}'");
            }
            Ok(())
        })?;
        info!(language = id, "language disabled");
        Ok(state)
    }

    fn incomplete(&self, paths: &CommitDir, reason: String) -> anyhow::Error {
        PipelineError::ActivationIncomplete {
            variant: paths.variant(),
            commit: paths.commit().clone(),
            reason,
        }
        .into()
    }
}

/// Word count of a pool file, or `None` when the file does not exist.
fn pool_len(paths: &CommitDir, name: &str) -> Result<Option<usize>> {
    let file = paths.file(name);
    match fs::read_to_string(&file) {
        Ok(text) => Ok(Some(parse_word_list(&text).words.len())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PipelineError::Io {
            path: file,
            source: err,
        }
        .into()),
    }
}

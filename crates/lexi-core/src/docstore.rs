//! Generic durable document store.
//!
//! One instance owns one JSON file and one in-memory cache of its
//! normalized state. Mutations run one at a time: the store's mutex is the
//! serialized queue, held across the atomic persist so that concurrent
//! callers are fully ordered and a reader can never observe a half-applied
//! mutation. A mutation that returns an error leaves cache and disk
//! untouched and does not block later mutations.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fsx::write_atomic;
use crate::timefmt;

/// What a store instantiation supplies: its file name, a default, a
/// repairing normalizer, and a retention policy.
pub trait StoreSchema: Clone + Serialize + Send + 'static {
    /// On-disk file name, e.g. `leaderboard.json`.
    const FILE_NAME: &'static str;

    fn default_state() -> Self;

    /// Rebuilds a valid state from arbitrary JSON. Must not fail: invalid
    /// records are discarded or default-filled, never raised.
    fn normalize(raw: &Value) -> Self;

    /// Drops the oldest eligible records past the store's retention cap,
    /// with a deterministic tie-break.
    fn prune(&mut self);

    /// Startup repair, run once per load from disk. Records that only make
    /// sense while a process is alive (e.g. an in-flight job) get resolved
    /// here, not in `normalize`, so in-memory mutations are untouched.
    fn recover(&mut self) {}

    fn updated_at(&self) -> &str;
    fn set_updated_at(&mut self, ts: String);
}

pub struct DocStore<S: StoreSchema> {
    path: PathBuf,
    state: Mutex<Option<S>>,
}

impl<S: StoreSchema> DocStore<S> {
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        DocStore {
            path: dir.join(S::FILE_NAME),
            state: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a deep copy of the cached state, loading (and repairing if
    /// needed) on first access.
    ///
    /// # Errors
    ///
    /// Only I/O failures while reading or seeding the file surface here;
    /// corrupt content is repaired, not raised.
    pub fn snapshot(&self) -> Result<S> {
        let mut guard = self.lock();
        Ok(self.loaded(&mut guard)?.clone())
    }

    /// Applies `f` to a deep-copied draft and persists the result.
    ///
    /// On success the draft is re-normalized, `updatedAt` advances
    /// monotonically, retention runs, and the new state is written
    /// atomically before replacing the cache. On error nothing changes.
    ///
    /// # Errors
    ///
    /// Propagates errors from `f` and from persistence; both leave the
    /// store in its previous state.
    pub fn mutate<F>(&self, f: F) -> Result<S>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        let mut guard = self.lock();
        let current = self.loaded(&mut guard)?;
        let previous_updated_at = current.updated_at().to_string();

        let mut draft = current.clone();
        f(&mut draft)?;

        let raw = serde_json::to_value(&draft).context("serializing store draft")?;
        let mut next = S::normalize(&raw);
        let now = timefmt::utc_now();
        next.set_updated_at(if now > previous_updated_at {
            now
        } else {
            previous_updated_at
        });
        next.prune();

        self.persist(&next)?;
        *guard = Some(next.clone());
        Ok(next)
    }

    fn lock(&self) -> MutexGuard<'_, Option<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn loaded<'a>(&self, guard: &'a mut MutexGuard<'_, Option<S>>) -> Result<&'a S> {
        if guard.is_none() {
            **guard = Some(self.load_from_disk()?);
        }
        // Populated just above.
        guard
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("store cache unexpectedly empty"))
    }

    fn load_from_disk(&self) -> Result<S> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent, seeding default");
                let state = S::default_state();
                self.persist(&state)?;
                return Ok(state);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading store file {}", self.path.display()))
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(raw) => {
                let mut state = S::normalize(&raw);
                state.recover();
                let canonical = serde_json::to_value(&state).context("serializing store state")?;
                if canonical != raw {
                    warn!(
                        path = %self.path.display(),
                        "store file failed normalization, persisting repaired snapshot"
                    );
                    self.persist(&state)?;
                }
                Ok(state)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "store file unparsable, persisting default snapshot"
                );
                let state = S::default_state();
                self.persist(&state)?;
                Ok(state)
            }
        }
    }

    fn persist(&self, state: &S) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(state).context("serializing store state")?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("persisting store file {}", self.path.display()))?;
        Ok(())
    }
}

use std::path::Path;

use anyhow::{bail, Result};
use lexi_domain::store::{GameResult, LeaderboardState, Profile};
use serde_json::Value;

use crate::docstore::{DocStore, StoreSchema};
use crate::timefmt;

impl StoreSchema for LeaderboardState {
    const FILE_NAME: &'static str = "leaderboard.json";

    fn default_state() -> Self {
        LeaderboardState::default_state()
    }

    fn normalize(raw: &Value) -> Self {
        LeaderboardState::normalize(raw)
    }

    fn prune(&mut self) {
        LeaderboardState::prune(self);
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn set_updated_at(&mut self, ts: String) {
        self.updated_at = ts;
    }
}

/// Player profiles and per-day results.
pub struct LeaderboardStore {
    store: DocStore<LeaderboardState>,
}

impl LeaderboardStore {
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        LeaderboardStore {
            store: DocStore::open(dir),
        }
    }

    /// # Errors
    ///
    /// Surfaces persistence failures; corrupt files are repaired silently.
    pub fn snapshot(&self) -> Result<LeaderboardState> {
        self.store.snapshot()
    }

    /// Creates a profile. Registering an existing id is an error.
    ///
    /// # Errors
    ///
    /// Fails on duplicate or empty ids and on persistence failures.
    pub fn register_profile(&self, id: &str, name: &str) -> Result<LeaderboardState> {
        let id = id.trim().to_string();
        let name = if name.trim().is_empty() {
            id.clone()
        } else {
            name.trim().to_string()
        };
        self.store.mutate(|state| {
            if id.is_empty() {
                bail!("profile id must not be empty");
            }
            if state.profiles.iter().any(|p| p.id == id) {
                bail!("profile '{id}' already exists");
            }
            state.profiles.push(Profile {
                id: id.clone(),
                name: name.clone(),
                created_at: timefmt::utc_now(),
                results: Vec::new(),
            });
            Ok(())
        })
    }

    /// Records a result; duplicate same-day submissions keep the best
    /// outcome.
    ///
    /// # Errors
    ///
    /// Fails for unknown profiles; nothing is persisted in that case.
    pub fn submit_result(&self, profile_id: &str, result: GameResult) -> Result<LeaderboardState> {
        self.store.mutate(|state| {
            if !state.record_result(profile_id, result.clone()) {
                bail!("unknown profile '{profile_id}'");
            }
            Ok(())
        })
    }
}

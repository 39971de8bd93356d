//! Persisted document-store snapshots and their normalizers.
//!
//! Each snapshot type owns a `normalize` that turns arbitrary on-disk JSON
//! into a valid state, discarding or default-filling bad records instead of
//! failing: a store must never refuse to start because its file was
//! corrupted by an operator or a deployment. Pruning policies live next to
//! the types they bound.

pub mod app_config;
pub mod jobs;
pub mod languages;
pub mod leaderboard;

pub use app_config::AppConfigState;
pub use jobs::{ImportJob, JobStatus, JobsState};
pub use languages::{LanguageEntry, LanguageSource, ProviderRef, RegistryState};
pub use leaderboard::{GameResult, LeaderboardState, Profile};

/// Timestamp used when a record is missing one; sorts before anything real.
pub const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Accepts only paths that stay inside the data directory when joined.
#[must_use]
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return false;
    }
    path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(ToString::to_string)
}

pub(crate) fn timestamp_or_epoch(value: &serde_json::Value, key: &str) -> String {
    string_field(value, key).unwrap_or_else(|| EPOCH.to_string())
}

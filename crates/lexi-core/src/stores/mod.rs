//! The document-store instantiations.
//!
//! Each wires a domain snapshot type into the generic [`crate::DocStore`]
//! pattern (normalizer + retention from `lexi-domain`) and exposes the
//! handful of typed operations its consumers actually perform.

mod app_config;
mod jobs;
mod leaderboard;

pub use app_config::AppConfigStore;
pub use jobs::JobsStore;
pub use leaderboard::LeaderboardStore;

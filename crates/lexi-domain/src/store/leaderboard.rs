//! Leaderboard snapshot: player profiles and their per-day game results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{timestamp_or_epoch, EPOCH};

pub const LEADERBOARD_SCHEMA_VERSION: u32 = 1;

/// Retention bounds; pruning drops the oldest eligible records first with
/// the record id as the deterministic tie-break.
pub const MAX_PROFILES: usize = 500;
pub const MAX_RESULTS_PER_PROFILE: usize = 366;

const MAX_ATTEMPTS: u8 = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub day: String,
    pub language: String,
    pub win: bool,
    pub attempts: u8,
    pub submitted_at: String,
}

impl GameResult {
    /// Best-outcome ordering for duplicate submissions: a win beats a loss,
    /// and among wins fewer attempts beat more. Losses never replace.
    #[must_use]
    pub fn better_than(&self, other: &GameResult) -> bool {
        match (self.win, other.win) {
            (true, false) => true,
            (false, _) => false,
            (true, true) => self.attempts < other.attempts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub results: Vec<GameResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardState {
    pub schema_version: u32,
    pub updated_at: String,
    pub profiles: Vec<Profile>,
}

impl LeaderboardState {
    #[must_use]
    pub fn default_state() -> Self {
        LeaderboardState {
            schema_version: LEADERBOARD_SCHEMA_VERSION,
            updated_at: EPOCH.to_string(),
            profiles: Vec::new(),
        }
    }

    /// Rebuilds a valid snapshot from untrusted JSON, dropping records that
    /// do not fit and merging duplicate same-day results by best outcome.
    #[must_use]
    pub fn normalize(raw: &Value) -> Self {
        let mut state = LeaderboardState::default_state();
        state.updated_at = timestamp_or_epoch(raw, "updatedAt");
        let Some(profiles) = raw.get("profiles").and_then(Value::as_array) else {
            return state;
        };
        for value in profiles {
            let Some(profile) = normalize_profile(value) else {
                continue;
            };
            if state.profiles.iter().any(|p| p.id == profile.id) {
                continue;
            }
            state.profiles.push(profile);
        }
        state.profiles.sort_by(|a, b| a.id.cmp(&b.id));
        state
    }

    /// Records one result, keeping the best outcome for a (day, language)
    /// pair that was already submitted.
    pub fn record_result(&mut self, profile_id: &str, result: GameResult) -> bool {
        let Some(profile) = self.profiles.iter_mut().find(|p| p.id == profile_id) else {
            return false;
        };
        match profile
            .results
            .iter_mut()
            .find(|r| r.day == result.day && r.language == result.language)
        {
            Some(existing) => {
                if result.better_than(existing) {
                    *existing = result;
                }
            }
            None => profile.results.push(result),
        }
        true
    }

    pub fn prune(&mut self) {
        if self.profiles.len() > MAX_PROFILES {
            self.profiles
                .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            let excess = self.profiles.len() - MAX_PROFILES;
            self.profiles.drain(..excess);
            self.profiles.sort_by(|a, b| a.id.cmp(&b.id));
        }
        for profile in &mut self.profiles {
            if profile.results.len() > MAX_RESULTS_PER_PROFILE {
                profile
                    .results
                    .sort_by(|a, b| a.day.cmp(&b.day).then(a.language.cmp(&b.language)));
                let excess = profile.results.len() - MAX_RESULTS_PER_PROFILE;
                profile.results.drain(..excess);
            }
        }
    }
}

fn normalize_profile(value: &Value) -> Option<Profile> {
    let id = value.get("id")?.as_str()?.trim().to_string();
    if id.is_empty() {
        return None;
    }
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| id.clone());
    let created_at = timestamp_or_epoch(value, "createdAt");

    let mut results: Vec<GameResult> = Vec::new();
    if let Some(raw_results) = value.get("results").and_then(Value::as_array) {
        for raw in raw_results {
            let Some(result) = normalize_result(raw) else {
                continue;
            };
            match results
                .iter_mut()
                .find(|r| r.day == result.day && r.language == result.language)
            {
                Some(existing) => {
                    if result.better_than(existing) {
                        *existing = result;
                    }
                }
                None => results.push(result),
            }
        }
    }
    results.sort_by(|a, b| a.day.cmp(&b.day).then(a.language.cmp(&b.language)));

    Some(Profile {
        id,
        name,
        created_at,
        results,
    })
}

fn normalize_result(value: &Value) -> Option<GameResult> {
    let result: GameResult = serde_json::from_value(value.clone()).ok()?;
    if !is_day(&result.day) {
        return None;
    }
    if result.attempts == 0 || result.attempts > MAX_ATTEMPTS {
        return None;
    }
    if result.language.trim().is_empty() {
        return None;
    }
    Some(result)
}

fn is_day(day: &str) -> bool {
    let bytes = day.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(day: &str, win: bool, attempts: u8) -> GameResult {
        GameResult {
            day: day.to_string(),
            language: "en".to_string(),
            win,
            attempts,
            submitted_at: "2026-02-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn normalize_survives_garbage() {
        let state = LeaderboardState::normalize(&json!({"profiles": "nope"}));
        assert_eq!(state, LeaderboardState::default_state());
        let state = LeaderboardState::normalize(&json!(42));
        assert!(state.profiles.is_empty());
    }

    #[test]
    fn normalize_drops_invalid_results_and_duplicate_profiles() {
        let raw = json!({
            "updatedAt": "2026-02-01T00:00:00Z",
            "profiles": [
                {"id": "p1", "results": [
                    {"day": "2026-02-01", "language": "en", "win": true, "attempts": 3, "submittedAt": "x"},
                    {"day": "not-a-day", "language": "en", "win": true, "attempts": 3, "submittedAt": "x"},
                    {"day": "2026-02-02", "language": "en", "win": false, "attempts": 0, "submittedAt": "x"}
                ]},
                {"id": "p1", "name": "dupe", "results": []},
                {"id": "   ", "results": []}
            ]
        });
        let state = LeaderboardState::normalize(&raw);
        assert_eq!(state.profiles.len(), 1);
        assert_eq!(state.profiles[0].results.len(), 1);
        assert_eq!(state.updated_at, "2026-02-01T00:00:00Z");
    }

    #[test]
    fn round_trip_is_identity_for_normalized_state() {
        let raw = json!({
            "updatedAt": "2026-02-01T00:00:00Z",
            "profiles": [
                {"id": "p2", "name": "Two", "createdAt": "2026-01-02T00:00:00Z", "results": []},
                {"id": "p1", "name": "One", "createdAt": "2026-01-01T00:00:00Z", "results": [
                    {"day": "2026-02-01", "language": "en", "win": true, "attempts": 4, "submittedAt": "t"}
                ]}
            ]
        });
        let state = LeaderboardState::normalize(&raw);
        let serialized = serde_json::to_value(&state).unwrap();
        assert_eq!(LeaderboardState::normalize(&serialized), state);
    }

    #[test]
    fn best_outcome_wins_for_same_day() {
        let mut state = LeaderboardState::default_state();
        state.profiles.push(Profile {
            id: "p1".to_string(),
            name: "One".to_string(),
            created_at: EPOCH.to_string(),
            results: vec![],
        });
        assert!(state.record_result("p1", result("2026-02-01", true, 2)));
        assert!(state.record_result("p1", result("2026-02-01", true, 1)));
        assert!(state.record_result("p1", result("2026-02-01", false, 6)));
        assert_eq!(state.profiles[0].results.len(), 1);
        assert_eq!(state.profiles[0].results[0].attempts, 1);
        assert!(state.profiles[0].results[0].win);
    }

    #[test]
    fn record_result_for_unknown_profile_is_rejected() {
        let mut state = LeaderboardState::default_state();
        assert!(!state.record_result("ghost", result("2026-02-01", true, 2)));
    }

    #[test]
    fn prune_drops_oldest_profiles_with_id_tiebreak() {
        let mut state = LeaderboardState::default_state();
        for i in 0..(MAX_PROFILES + 2) {
            state.profiles.push(Profile {
                id: format!("p{i:04}"),
                name: String::new(),
                created_at: EPOCH.to_string(),
                results: vec![],
            });
        }
        state.prune();
        assert_eq!(state.profiles.len(), MAX_PROFILES);
        // Identical created_at everywhere, so the two lowest ids go.
        assert!(!state.profiles.iter().any(|p| p.id == "p0000"));
        assert!(!state.profiles.iter().any(|p| p.id == "p0001"));
    }
}

//! Playable-word shape rules.
//!
//! The bounds are fixed by the game, not by pipeline callers: every stage
//! downstream of morphological expansion assumes the vocabulary already fits
//! this shape, so making them configurable would let one import produce a
//! language the gameplay loop cannot serve.

/// Shortest word the game will accept or ask for.
pub const MIN_WORD_LEN: usize = 3;

/// Longest word the game will accept or ask for.
pub const MAX_WORD_LEN: usize = 10;

/// Uppercases a candidate token and validates its shape.
///
/// Returns `None` for tokens with non-ASCII-alphabetic characters or lengths
/// outside the fixed bounds; callers count those drops rather than failing.
#[must_use]
pub fn normalize_word(token: &str) -> Option<String> {
    let token = token.trim();
    if token.len() < MIN_WORD_LEN || token.len() > MAX_WORD_LEN {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(token.to_ascii_uppercase())
}

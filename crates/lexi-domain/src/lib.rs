#![deny(clippy::all, warnings)]

//! Pure data model for the lexi word-game data plane.
//!
//! Everything in this crate is deterministic and side-effect free: variant
//! and revision identifiers, the playable-word shape rules, the word-list
//! text codec, the affix expansion engine, pipeline manifests, and the
//! normalizers for every persisted document-store snapshot.

pub mod affix;
pub mod manifest;
pub mod revision;
pub mod store;
pub mod variant;
pub mod wordlist;
pub mod words;

pub use affix::{AffixRules, DicEntry, Dictionary};
pub use manifest::{
    AnswerFilterManifest, ExpansionManifest, FilterMode, PoolPolicyManifest, SourceFile,
    SourceManifest,
};
pub use revision::{ChecksumHex, CommitId};
pub use variant::Variant;
pub use wordlist::{parse_word_list, render_word_list, WordList};
pub use words::{normalize_word, MAX_WORD_LEN, MIN_WORD_LEN};

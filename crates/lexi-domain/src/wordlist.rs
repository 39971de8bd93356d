//! Text codec for persisted word pools.
//!
//! One uppercase token per line, byte-sorted, unique, trailing newline. The
//! byte sort is deliberate: it is locale-independent, so re-running a stage
//! on unchanged input reproduces its output file exactly.

use std::collections::BTreeSet;

use crate::words::normalize_word;

/// Parsed word pool plus the count of lines the shape filter discarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordList {
    pub words: BTreeSet<String>,
    pub dropped: u64,
}

impl WordList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Parses word-list text, silently dropping (and counting) lines that fail
/// the playable-word shape. Blank lines are ignored without counting.
#[must_use]
pub fn parse_word_list(text: &str) -> WordList {
    let mut list = WordList::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match normalize_word(line) {
            Some(word) => {
                list.words.insert(word);
            }
            None => list.dropped += 1,
        }
    }
    list
}

/// Renders a pool in its canonical on-disk form.
#[must_use]
pub fn render_word_list<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = String::new();
    for word in words {
        out.push_str(word);
        out.push('\n');
    }
    out
}

//! Hunspell-style affix rule engine.
//!
//! Supports the subset of the `.aff` format the upstream dictionaries use
//! for word-game purposes: `PFX`/`SFX` classes with strip/add/condition
//! rules and cross-product combination. Two-fold suffix stripping and
//! compounding directives are intentionally not modeled; surface forms they
//! would add are outside the playable-word shape anyway.

use std::collections::BTreeSet;

/// Structural problems in an affix or dictionary source file.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AffixParseError {
    #[error("affix line {line}: malformed {kind} header '{text}'")]
    BadHeader {
        kind: &'static str,
        line: usize,
        text: String,
    },
    #[error("affix line {line}: malformed {kind} rule '{text}'")]
    BadRule {
        kind: &'static str,
        line: usize,
        text: String,
    },
    #[error("affix line {line}: unbalanced character class in condition '{text}'")]
    BadCondition { line: usize, text: String },
    #[error("dictionary is empty")]
    EmptyDictionary,
}

/// One base dictionary entry: the uninflected word plus its affix flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DicEntry {
    pub word: String,
    pub flags: Vec<char>,
}

/// Parsed `.dic` file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    pub entries: Vec<DicEntry>,
}

impl Dictionary {
    /// Base words with continuation classes stripped, in file order.
    pub fn base_words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.word.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CondAtom {
    Any,
    Class { negated: bool, chars: Vec<char> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Condition {
    atoms: Vec<CondAtom>,
}

impl Condition {
    fn parse(text: &str, line: usize) -> Result<Self, AffixParseError> {
        let mut atoms = Vec::new();
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '.' => atoms.push(CondAtom::Any),
                '[' => {
                    let negated = chars.peek() == Some(&'^');
                    if negated {
                        chars.next();
                    }
                    let mut class = Vec::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => class.push(c),
                            None => {
                                return Err(AffixParseError::BadCondition {
                                    line,
                                    text: text.to_string(),
                                })
                            }
                        }
                    }
                    atoms.push(CondAtom::Class {
                        negated,
                        chars: class,
                    });
                }
                c => atoms.push(CondAtom::Class {
                    negated: false,
                    chars: vec![c],
                }),
            }
        }
        Ok(Condition { atoms })
    }

    fn atom_matches(atom: &CondAtom, ch: char) -> bool {
        match atom {
            CondAtom::Any => true,
            CondAtom::Class { negated, chars } => chars.contains(&ch) != *negated,
        }
    }

    /// Matches the end of `word` (suffix conditions apply pre-strip).
    fn matches_end(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < self.atoms.len() {
            return false;
        }
        let tail = &chars[chars.len() - self.atoms.len()..];
        self.atoms
            .iter()
            .zip(tail)
            .all(|(atom, ch)| Self::atom_matches(atom, *ch))
    }

    /// Matches the start of `word` (prefix conditions).
    fn matches_start(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < self.atoms.len() {
            return false;
        }
        self.atoms
            .iter()
            .zip(&chars[..self.atoms.len()])
            .all(|(atom, ch)| Self::atom_matches(atom, *ch))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AffixRule {
    strip: String,
    add: String,
    condition: Condition,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AffixClass {
    flag: char,
    cross_product: bool,
    rules: Vec<AffixRule>,
}

/// Parsed `.aff` file: every `PFX`/`SFX` class keyed by flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffixRules {
    prefixes: Vec<AffixClass>,
    suffixes: Vec<AffixClass>,
}

impl AffixRules {
    fn prefix(&self, flag: char) -> Option<&AffixClass> {
        self.prefixes.iter().find(|class| class.flag == flag)
    }

    fn suffix(&self, flag: char) -> Option<&AffixClass> {
        self.suffixes.iter().find(|class| class.flag == flag)
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.prefixes.len() + self.suffixes.len()
    }
}

/// Parses the affix rule file.
///
/// Directives other than `PFX`/`SFX` (`SET`, `TRY`, `REP`, ...) are ignored;
/// they steer suggestion quality in spelling checkers, not expansion.
///
/// # Errors
///
/// Returns [`AffixParseError`] for malformed headers, rules, or conditions.
pub fn parse_affix(text: &str) -> Result<AffixRules, AffixParseError> {
    let mut rules = AffixRules::default();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let kind = match fields[0] {
            "PFX" => "PFX",
            "SFX" => "SFX",
            _ => continue,
        };

        if is_class_header(&fields) {
            let flag = single_flag(fields[1]).ok_or_else(|| AffixParseError::BadHeader {
                kind,
                line: line_no,
                text: raw.to_string(),
            })?;
            let class = AffixClass {
                flag,
                cross_product: fields[2] == "Y",
                rules: Vec::new(),
            };
            if kind == "PFX" {
                rules.prefixes.push(class);
            } else {
                rules.suffixes.push(class);
            }
            continue;
        }

        if fields.len() < 4 {
            return Err(AffixParseError::BadRule {
                kind,
                line: line_no,
                text: raw.to_string(),
            });
        }
        let flag = single_flag(fields[1]).ok_or_else(|| AffixParseError::BadRule {
            kind,
            line: line_no,
            text: raw.to_string(),
        })?;
        let strip = if fields[2] == "0" { "" } else { fields[2] };
        // Continuation classes on the added affix are not expanded further.
        let add_raw = fields[3];
        let add = if add_raw == "0" {
            ""
        } else {
            add_raw.split('/').next().unwrap_or("")
        };
        let condition_text = fields.get(4).copied().unwrap_or(".");
        let rule = AffixRule {
            strip: strip.to_string(),
            add: add.to_string(),
            condition: Condition::parse(condition_text, line_no)?,
        };

        let classes = if kind == "PFX" {
            &mut rules.prefixes
        } else {
            &mut rules.suffixes
        };
        match classes.iter_mut().find(|class| class.flag == flag) {
            Some(class) => class.rules.push(rule),
            None => {
                return Err(AffixParseError::BadRule {
                    kind,
                    line: line_no,
                    text: raw.to_string(),
                })
            }
        }
    }
    Ok(rules)
}

fn is_class_header(fields: &[&str]) -> bool {
    fields.len() == 4
        && matches!(fields[2], "Y" | "N")
        && fields[3].bytes().all(|b| b.is_ascii_digit())
}

fn single_flag(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(flag), None) => Some(flag),
        _ => None,
    }
}

/// Parses the base dictionary.
///
/// The leading entry-count line is honored when present but never trusted;
/// entries are whatever the remaining lines contain. Morphological data
/// after a tab is discarded.
///
/// # Errors
///
/// Returns [`AffixParseError::EmptyDictionary`] when no entries survive.
pub fn parse_dictionary(text: &str) -> Result<Dictionary, AffixParseError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('\t').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if idx == 0 && line.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let (word, flag_part) = match line.split_once('/') {
            Some((word, flags)) => (word, flags),
            None => (line, ""),
        };
        if word.is_empty() {
            continue;
        }
        entries.push(DicEntry {
            word: word.to_string(),
            flags: flag_part.chars().collect(),
        });
    }
    if entries.is_empty() {
        return Err(AffixParseError::EmptyDictionary);
    }
    Ok(Dictionary { entries })
}

/// Expands every dictionary entry into its full set of surface forms.
///
/// The base word itself is always emitted; suffix and prefix rules fire per
/// flag where their condition matches, and cross-product classes combine a
/// prefix with each suffixed form.
#[must_use]
pub fn expand(dictionary: &Dictionary, rules: &AffixRules) -> BTreeSet<String> {
    let mut forms = BTreeSet::new();
    for entry in &dictionary.entries {
        expand_entry(entry, rules, &mut forms);
    }
    forms
}

fn expand_entry(entry: &DicEntry, rules: &AffixRules, out: &mut BTreeSet<String>) {
    out.insert(entry.word.clone());

    let mut suffixed: Vec<(String, bool)> = Vec::new();
    for &flag in &entry.flags {
        if let Some(class) = rules.suffix(flag) {
            for rule in &class.rules {
                if let Some(form) = apply_suffix(&entry.word, rule) {
                    suffixed.push((form, class.cross_product));
                }
            }
        }
    }
    for (form, _) in &suffixed {
        out.insert(form.clone());
    }

    for &flag in &entry.flags {
        let Some(class) = rules.prefix(flag) else {
            continue;
        };
        for rule in &class.rules {
            if let Some(form) = apply_prefix(&entry.word, rule) {
                out.insert(form);
            }
            if !class.cross_product {
                continue;
            }
            for (form, crossable) in &suffixed {
                if *crossable {
                    if let Some(combined) = apply_prefix(form, rule) {
                        out.insert(combined);
                    }
                }
            }
        }
    }
}

fn apply_suffix(word: &str, rule: &AffixRule) -> Option<String> {
    if !rule.condition.matches_end(word) {
        return None;
    }
    let stem = word.strip_suffix(rule.strip.as_str())?;
    Some(format!("{stem}{}", rule.add))
}

fn apply_prefix(word: &str, rule: &AffixRule) -> Option<String> {
    if !rule.condition.matches_start(word) {
        return None;
    }
    let stem = word.strip_prefix(rule.strip.as_str())?;
    Some(format!("{}{stem}", rule.add))
}

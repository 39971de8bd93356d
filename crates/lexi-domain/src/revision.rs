use std::fmt;

use serde::{Deserialize, Serialize};

/// Pinned upstream revision, the content address for one import.
///
/// Always a full 40-character lowercase hex SHA; branch names and short
/// hashes are rejected so artifact directories stay collision-free.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// # Errors
    ///
    /// Returns the offending input when it is not a full lowercase hex SHA.
    pub fn parse(input: &str) -> Result<Self, String> {
        if input.len() == 40 && input.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(CommitId(input.to_string()))
        } else {
            Err(input.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CommitId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CommitId::parse(&value)
    }
}

impl From<CommitId> for String {
    fn from(value: CommitId) -> Self {
        value.0
    }
}

/// Caller-supplied SHA-256 digest in hex form.
///
/// Uppercase input is folded to lowercase so digest comparison is a plain
/// string equality everywhere downstream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChecksumHex(String);

impl ChecksumHex {
    /// # Errors
    ///
    /// Returns the offending input when it is not 64 hex characters.
    pub fn parse(input: &str) -> Result<Self, String> {
        if input.len() == 64 && input.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(ChecksumHex(input.to_ascii_lowercase()))
        } else {
            Err(input.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a freshly computed lowercase hex digest.
    #[must_use]
    pub fn matches(&self, computed: &str) -> bool {
        self.0 == computed
    }
}

impl fmt::Display for ChecksumHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChecksumHex {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChecksumHex::parse(&value)
    }
}

impl From<ChecksumHex> for String {
    fn from(value: ChecksumHex) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn accepts_full_lowercase_sha() {
        assert_eq!(CommitId::parse(SHA).unwrap().as_str(), SHA);
    }

    #[test]
    fn rejects_short_upper_or_nonhex() {
        assert!(CommitId::parse("abc123").is_err());
        assert!(CommitId::parse(&SHA.to_ascii_uppercase()).is_err());
        assert!(CommitId::parse(&format!("{}g", &SHA[..39])).is_err());
    }

    #[test]
    fn checksum_folds_case() {
        let digest = "A".repeat(64);
        let parsed = ChecksumHex::parse(&digest).unwrap();
        assert_eq!(parsed.as_str(), "a".repeat(64));
        assert!(parsed.matches(&"a".repeat(64)));
    }

    #[test]
    fn checksum_rejects_wrong_length() {
        assert!(ChecksumHex::parse("deadbeef").is_err());
    }
}

//! Content-addressed artifact layout.
//!
//! Every import writes under `providers/<variant>/<commit>/`; the full
//! lowercase hex commit keys the directory, so concurrent imports of
//! different variants or revisions can never collide and re-imports land
//! exactly where the first run did.

use std::path::{Path, PathBuf};

use lexi_domain::{CommitId, Variant};

pub const SOURCE_MANIFEST: &str = "source-manifest.json";
pub const DIC_FILE: &str = "index.dic";
pub const AFF_FILE: &str = "index.aff";
pub const EXPANDED_FORMS: &str = "expanded-forms.txt";
pub const EXPANSION_MANIFEST: &str = "expanded-forms.json";
pub const GUESS_POOL: &str = "guess-pool.txt";
pub const ANSWER_POOL: &str = "answer-pool.txt";
pub const ANSWER_POOL_ACTIVE: &str = "answer-pool-active.txt";
pub const POOL_POLICY: &str = "pool-policy.json";
pub const ANSWER_FILTER: &str = "answer-filter.json";
pub const FAMILY_DENYLIST: &str = "family-denylist.txt";
pub const FAMILY_ALLOWLIST: &str = "family-allowlist.txt";
pub const IRREGULAR_ALLOWLIST: &str = "irregular-answer-allowlist.txt";

/// Resolved commit directory for one (variant, commit) pair.
#[derive(Clone, Debug)]
pub struct CommitDir {
    variant: Variant,
    commit: CommitId,
    dir: PathBuf,
}

impl CommitDir {
    #[must_use]
    pub fn new(data_dir: &Path, variant: Variant, commit: CommitId) -> Self {
        let dir = data_dir
            .join("providers")
            .join(variant.as_str())
            .join(commit.as_str());
        CommitDir {
            variant,
            commit,
            dir,
        }
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn commit(&self) -> &CommitId {
        &self.commit
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Registry-facing path, relative to the data directory.
    #[must_use]
    pub fn relative_file(&self, name: &str) -> String {
        format!(
            "providers/{}/{}/{name}",
            self.variant.as_str(),
            self.commit.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_content_addressed() {
        let commit = CommitId::parse(&"ef".repeat(20)).unwrap();
        let paths = CommitDir::new(Path::new("/data"), Variant::EnGb, commit.clone());
        assert_eq!(
            paths.file(GUESS_POOL),
            Path::new("/data/providers/en-GB")
                .join(commit.as_str())
                .join("guess-pool.txt")
        );
        assert_eq!(
            paths.relative_file(ANSWER_POOL_ACTIVE),
            format!("providers/en-GB/{commit}/answer-pool-active.txt")
        );
    }
}

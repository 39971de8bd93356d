//! Pipeline stage manifests.
//!
//! Every stage writes one of these next to its data artifacts so the next
//! stage (and operators auditing an import) can check provenance and funnel
//! counts without re-deriving anything. All manifests embed the variant and
//! commit they were derived from; consumers refuse mismatches.

use serde::{Deserialize, Serialize};

use crate::revision::CommitId;
use crate::variant::Variant;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Per-file record inside [`SourceManifest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub name: String,
    pub sha256: String,
    pub bytes: u64,
}

/// Written by Fetch&Verify: what was downloaded, from where, and its digests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceManifest {
    pub schema_version: u32,
    pub provider_id: String,
    pub repository: String,
    pub variant: Variant,
    pub commit: CommitId,
    pub files: Vec<SourceFile>,
    pub retrieved_at: String,
}

impl SourceManifest {
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Written by Morphological Expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionManifest {
    pub schema_version: u32,
    pub variant: Variant,
    pub commit: CommitId,
    pub entry_count: u64,
    pub expanded_count: u64,
    pub dropped_count: u64,
    pub generated_at: String,
}

/// Written by Pool Policy: how the guess and answer pools were derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPolicyManifest {
    pub schema_version: u32,
    pub variant: Variant,
    pub commit: CommitId,
    pub guess_policy: String,
    pub answer_policy: String,
    pub guess_pool: u64,
    pub answer_pool: u64,
    pub base_words: u64,
    pub bases_outside_guess_pool: u64,
    pub irregular_added: u64,
    pub irregular_rejected: u64,
    pub generated_at: String,
}

/// Family-safety filtering behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Subtract the denylist; a missing denylist file means nothing to deny.
    DenylistOnly,
    /// Subtract the denylist, then keep only allowlisted words. A missing
    /// allowlist file under this mode is a configuration error.
    AllowlistRequired,
}

impl FilterMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::DenylistOnly => "denylist-only",
            FilterMode::AllowlistRequired => "allowlist-required",
        }
    }

    /// # Errors
    ///
    /// Returns the offending input for unknown modes.
    pub fn parse(input: &str) -> Result<Self, String> {
        match input {
            "denylist-only" => Ok(FilterMode::DenylistOnly),
            "allowlist-required" => Ok(FilterMode::AllowlistRequired),
            other => Err(other.to_string()),
        }
    }
}

/// Written by the Family-Safety Filter: the full audit funnel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFilterManifest {
    pub schema_version: u32,
    pub variant: Variant,
    pub commit: CommitId,
    pub mode: FilterMode,
    pub input: u64,
    pub denied: u64,
    pub not_allowlisted: u64,
    pub activated: u64,
    pub generated_at: String,
}

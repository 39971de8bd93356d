//! Provider import pipeline.
//!
//! Four sequential stages turn an upstream morphological dictionary into a
//! vetted, deterministic word pool. Stages communicate only through the
//! files they read and write under the content-addressed commit directory;
//! each validates the provenance recorded by the one before it and re-runs
//! idempotently on unchanged inputs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lexi_domain::{CommitId, Variant};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::fsx::{write_atomic, WriteError};

pub mod expand;
pub mod fetch;
pub mod filter;
pub mod paths;
pub mod pool;
#[cfg(test)]
pub(crate) mod test_support;

/// Everything that can go wrong across the pipeline.
///
/// Validation and integrity failures are terminal; transient upstream
/// trouble carries `retriable() == true` so callers can retry on their own
/// schedule without string-matching messages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown variant '{0}'")]
    InvalidVariant(String),
    #[error("commit must be a full 40-character lowercase hex sha (got '{0}')")]
    InvalidCommit(String),
    #[error("checksum must be 64 hex characters (got '{0}')")]
    InvalidChecksum(String),
    #[error("checksum mismatch for {file} (expected {expected}, got {actual})")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error(
        "provenance mismatch: requested {want_variant}@{want_commit} but manifest records {found_variant}@{found_commit}"
    )]
    ProvenanceMismatch {
        want_variant: String,
        want_commit: String,
        found_variant: String,
        found_commit: String,
    },
    #[error("missing artifact {file}; run the earlier pipeline stage first")]
    MissingArtifact { file: String },
    #[error("malformed {what}: {detail}")]
    ParseFailed { what: &'static str, detail: String },
    #[error("guess pool is empty after filtering")]
    GuessPoolEmpty,
    #[error("answer pool is empty after filtering")]
    AnswerPoolEmpty,
    #[error("allowlist-required mode is set but {file} does not exist")]
    AllowlistRequired { file: String },
    #[error("cannot activate {variant}@{commit}: {reason}")]
    ActivationIncomplete {
        variant: Variant,
        commit: CommitId,
        reason: String,
    },
    #[error("upstream returned 404 for {url}")]
    NotFound { url: String },
    #[error("upstream rate limited the request for {url}")]
    RateLimited { url: String },
    #[error("upstream unavailable (status {status}) for {url}")]
    Upstream { status: u16, url: String },
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    #[error("network error fetching {url}: {detail}")]
    Network { url: String, detail: String },
    #[error("offline mode is enabled; refusing to fetch {url}")]
    Offline { url: String },
    #[error(transparent)]
    WriteFailed(#[from] WriteError),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("another import is already in progress")]
    ImportInProgress,
}

impl PipelineError {
    /// Whether an automatic retry could plausibly succeed.
    #[must_use]
    pub fn retriable(&self) -> bool {
        matches!(
            self,
            PipelineError::RateLimited { .. }
                | PipelineError::Upstream { .. }
                | PipelineError::Timeout { .. }
                | PipelineError::Network { .. }
        )
    }

    /// Stable machine-readable code for logs and JSON envelopes.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidVariant(_) => "INVALID_VARIANT",
            PipelineError::InvalidCommit(_) => "INVALID_COMMIT",
            PipelineError::InvalidChecksum(_) => "INVALID_CHECKSUM",
            PipelineError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            PipelineError::ProvenanceMismatch { .. } => "PROVENANCE_MISMATCH",
            PipelineError::MissingArtifact { .. } => "MISSING_ARTIFACT",
            PipelineError::ParseFailed { .. } => "PARSE_FAILED",
            PipelineError::GuessPoolEmpty => "GUESS_POOL_EMPTY",
            PipelineError::AnswerPoolEmpty => "ANSWER_POOL_EMPTY",
            PipelineError::AllowlistRequired { .. } => "ALLOWLIST_REQUIRED",
            PipelineError::ActivationIncomplete { .. } => "ACTIVATION_INCOMPLETE",
            PipelineError::NotFound { .. } => "UPSTREAM_NOT_FOUND",
            PipelineError::RateLimited { .. } => "UPSTREAM_RATE_LIMITED",
            PipelineError::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            PipelineError::Timeout { .. } => "UPSTREAM_TIMEOUT",
            PipelineError::Network { .. } => "NETWORK",
            PipelineError::Offline { .. } => "OFFLINE",
            PipelineError::WriteFailed(_) => "WRITE_FAILED",
            PipelineError::Io { .. } => "IO",
            PipelineError::ImportInProgress => "IMPORT_IN_PROGRESS",
        }
    }
}

pub(crate) fn check_provenance(
    found_variant: Variant,
    found_commit: &CommitId,
    want_variant: Variant,
    want_commit: &CommitId,
) -> Result<(), PipelineError> {
    if found_variant == want_variant && found_commit == want_commit {
        Ok(())
    } else {
        Err(PipelineError::ProvenanceMismatch {
            want_variant: want_variant.to_string(),
            want_commit: want_commit.to_string(),
            found_variant: found_variant.to_string(),
            found_commit: found_commit.to_string(),
        })
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, PipelineError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(PipelineError::MissingArtifact {
            file: path.display().to_string(),
        }),
        Err(err) => Err(PipelineError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

pub(crate) fn read_manifest<M: DeserializeOwned>(
    path: &Path,
    what: &'static str,
) -> Result<M, PipelineError> {
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|err| PipelineError::ParseFailed {
        what,
        detail: err.to_string(),
    })
}

pub(crate) fn write_manifest<M: Serialize>(path: &Path, manifest: &M) -> Result<(), PipelineError> {
    let mut bytes = serde_json::to_vec_pretty(manifest).map_err(|err| PipelineError::ParseFailed {
        what: "manifest",
        detail: err.to_string(),
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)?;
    Ok(())
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

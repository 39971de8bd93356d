//! Family-Safety Filter: the last gate before an answer pool can serve as
//! secret words.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use lexi_domain::manifest::{
    AnswerFilterManifest, FilterMode, PoolPolicyManifest, MANIFEST_SCHEMA_VERSION,
};
use lexi_domain::{parse_word_list, render_word_list};
use tracing::info;

use super::paths::{
    CommitDir, ANSWER_FILTER, ANSWER_POOL, ANSWER_POOL_ACTIVE, FAMILY_ALLOWLIST, FAMILY_DENYLIST,
    POOL_POLICY,
};
use super::{check_provenance, read_file, read_manifest, write_manifest, PipelineError};
use crate::fsx::write_atomic;

/// Runs the family-safety stage for one (variant, commit).
///
/// `denylist-only` subtracts `family-denylist.txt` (absent file means an
/// empty denylist). `allowlist-required` additionally keeps only words in
/// `family-allowlist.txt` and treats a missing allowlist file as a
/// configuration error, not an empty result.
///
/// # Errors
///
/// `ALLOWLIST_REQUIRED` when the mode demands an allowlist that is not
/// there; `ANSWER_POOL_EMPTY` when filtering would leave nothing.
pub fn filter_answers(
    paths: &CommitDir,
    mode: FilterMode,
) -> Result<AnswerFilterManifest, PipelineError> {
    let policy: PoolPolicyManifest = read_manifest(&paths.file(POOL_POLICY), "pool manifest")?;
    check_provenance(policy.variant, &policy.commit, paths.variant(), paths.commit())?;

    let answers = parse_word_list(&read_file(&paths.file(ANSWER_POOL))?).words;
    let input = answers.len() as u64;

    let denylist = optional_list(&paths.file(FAMILY_DENYLIST))?.unwrap_or_default();
    let mut active: BTreeSet<String> = answers
        .into_iter()
        .filter(|word| !denylist.contains(word))
        .collect();
    let denied = input - active.len() as u64;

    let mut not_allowlisted = 0u64;
    if mode == FilterMode::AllowlistRequired {
        let allowlist = optional_list(&paths.file(FAMILY_ALLOWLIST))?.ok_or_else(|| {
            PipelineError::AllowlistRequired {
                file: paths.relative_file(FAMILY_ALLOWLIST),
            }
        })?;
        let before = active.len() as u64;
        active.retain(|word| allowlist.contains(word));
        not_allowlisted = before - active.len() as u64;
    }

    if active.is_empty() {
        return Err(PipelineError::AnswerPoolEmpty);
    }

    write_atomic(
        &paths.file(ANSWER_POOL_ACTIVE),
        render_word_list(&active).as_bytes(),
    )?;

    let manifest = AnswerFilterManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        variant: paths.variant(),
        commit: paths.commit().clone(),
        mode,
        input,
        denied,
        not_allowlisted,
        activated: active.len() as u64,
        generated_at: policy.generated_at.clone(),
    };
    write_manifest(&paths.file(ANSWER_FILTER), &manifest)?;

    info!(
        variant = %paths.variant(),
        commit = %paths.commit(),
        mode = mode.as_str(),
        input,
        denied,
        not_allowlisted,
        activated = manifest.activated,
        "filtered answer pool"
    );
    Ok(manifest)
}

fn optional_list(path: &Path) -> Result<Option<BTreeSet<String>>, PipelineError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(parse_word_list(&text).words)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PipelineError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use lexi_domain::{CommitId, Variant};
    use tempfile::tempdir;

    use super::super::expand::expand_forms;
    use super::super::pool::derive_pools;
    use super::super::test_support::seed_sources;
    use super::*;

    fn prepared(dir: &Path) -> CommitDir {
        let paths = CommitDir::new(
            dir,
            Variant::EnUs,
            CommitId::parse(&"ab".repeat(20)).unwrap(),
        );
        seed_sources(
            &paths,
            "3\ndog/S\ncat\ndamn\n",
            "SFX S Y 1\nSFX S 0 s .\n",
        );
        expand_forms(&paths).unwrap();
        derive_pools(&paths).unwrap();
        paths
    }

    #[test]
    fn denylist_only_subtracts_and_counts() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        fs::write(paths.file(FAMILY_DENYLIST), "damn\n").unwrap();
        let manifest = filter_answers(&paths, FilterMode::DenylistOnly).unwrap();
        assert_eq!(manifest.input, 3);
        assert_eq!(manifest.denied, 1);
        assert_eq!(manifest.not_allowlisted, 0);
        assert_eq!(manifest.activated, 2);
        let active = fs::read_to_string(paths.file(ANSWER_POOL_ACTIVE)).unwrap();
        assert_eq!(active, "CAT\nDOG\n");
    }

    #[test]
    fn denylist_only_without_denylist_passes_everything() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        let manifest = filter_answers(&paths, FilterMode::DenylistOnly).unwrap();
        assert_eq!(manifest.activated, 3);
        assert_eq!(manifest.denied, 0);
    }

    #[test]
    fn allowlist_required_without_allowlist_file_is_refused() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        let err = filter_answers(&paths, FilterMode::AllowlistRequired).unwrap_err();
        assert_eq!(err.code(), "ALLOWLIST_REQUIRED");
        assert!(!paths.file(ANSWER_POOL_ACTIVE).exists());
    }

    #[test]
    fn allowlist_required_intersects_after_denylist() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        fs::write(paths.file(FAMILY_DENYLIST), "damn\n").unwrap();
        fs::write(paths.file(FAMILY_ALLOWLIST), "cat\ndamn\n").unwrap();
        let manifest = filter_answers(&paths, FilterMode::AllowlistRequired).unwrap();
        assert_eq!(manifest.denied, 1);
        assert_eq!(manifest.not_allowlisted, 1);
        assert_eq!(manifest.activated, 1);
        let active = fs::read_to_string(paths.file(ANSWER_POOL_ACTIVE)).unwrap();
        assert_eq!(active, "CAT\n");
    }

    #[test]
    fn filtering_everything_away_fails_closed() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        fs::write(paths.file(FAMILY_DENYLIST), "cat\ndog\ndamn\n").unwrap();
        let err = filter_answers(&paths, FilterMode::DenylistOnly).unwrap_err();
        assert_eq!(err.code(), "ANSWER_POOL_EMPTY");
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempdir().unwrap();
        let paths = prepared(dir.path());
        fs::write(paths.file(FAMILY_DENYLIST), "damn\n").unwrap();
        filter_answers(&paths, FilterMode::DenylistOnly).unwrap();
        let a = (
            fs::read(paths.file(ANSWER_POOL_ACTIVE)).unwrap(),
            fs::read(paths.file(ANSWER_FILTER)).unwrap(),
        );
        filter_answers(&paths, FilterMode::DenylistOnly).unwrap();
        let b = (
            fs::read(paths.file(ANSWER_POOL_ACTIVE)).unwrap(),
            fs::read(paths.file(ANSWER_FILTER)).unwrap(),
        );
        assert_eq!(a, b);
    }
}

//! Pool Policy: split the expanded vocabulary into the guess pool (every
//! accepted guess) and the answer pool (words eligible to be the secret).

use std::collections::BTreeSet;
use std::fs;

use lexi_domain::affix;
use lexi_domain::manifest::{ExpansionManifest, PoolPolicyManifest, MANIFEST_SCHEMA_VERSION};
use lexi_domain::{normalize_word, parse_word_list, render_word_list};
use tracing::{debug, info};

use super::paths::{
    CommitDir, ANSWER_POOL, DIC_FILE, EXPANDED_FORMS, EXPANSION_MANIFEST, GUESS_POOL,
    IRREGULAR_ALLOWLIST, POOL_POLICY,
};
use super::{check_provenance, read_file, read_manifest, write_manifest, PipelineError};
use crate::fsx::write_atomic;

pub const GUESS_POLICY: &str = "expanded-forms-v1";
pub const ANSWER_POLICY: &str = "uninflected-base-intersection-v1";

/// Runs the pool policy stage for one (variant, commit).
///
/// The guess pool is the expanded vocabulary verbatim. The answer pool is
/// the uninflected base words (continuation classes stripped) intersected
/// with the guess pool; a base that filtering removed from the guess pool
/// is excluded and counted. Entries of the optional irregular-form
/// allowlist join the answer pool only when the guess pool already accepts
/// them.
///
/// # Errors
///
/// Fails closed with `GUESS_POOL_EMPTY` / `ANSWER_POOL_EMPTY` instead of
/// producing a zero-size language, and refuses provenance mismatches.
pub fn derive_pools(paths: &CommitDir) -> Result<PoolPolicyManifest, PipelineError> {
    let expansion: ExpansionManifest =
        read_manifest(&paths.file(EXPANSION_MANIFEST), "expansion manifest")?;
    check_provenance(
        expansion.variant,
        &expansion.commit,
        paths.variant(),
        paths.commit(),
    )?;

    let guess_pool = parse_word_list(&read_file(&paths.file(EXPANDED_FORMS))?).words;
    if guess_pool.is_empty() {
        return Err(PipelineError::GuessPoolEmpty);
    }

    let dic_text = read_file(&paths.file(DIC_FILE))?;
    let dictionary = affix::parse_dictionary(&dic_text).map_err(|err| {
        PipelineError::ParseFailed {
            what: "dictionary",
            detail: err.to_string(),
        }
    })?;

    let mut answers: BTreeSet<String> = BTreeSet::new();
    let mut base_words: u64 = 0;
    let mut bases_outside: u64 = 0;
    for base in dictionary.base_words() {
        let Some(word) = normalize_word(base) else {
            continue;
        };
        base_words += 1;
        if guess_pool.contains(&word) {
            answers.insert(word);
        } else {
            bases_outside += 1;
        }
    }

    let (irregular_added, irregular_rejected) =
        merge_irregulars(paths, &guess_pool, &mut answers)?;

    if answers.is_empty() {
        return Err(PipelineError::AnswerPoolEmpty);
    }

    write_atomic(
        &paths.file(GUESS_POOL),
        render_word_list(&guess_pool).as_bytes(),
    )?;
    write_atomic(
        &paths.file(ANSWER_POOL),
        render_word_list(&answers).as_bytes(),
    )?;

    let manifest = PoolPolicyManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        variant: paths.variant(),
        commit: paths.commit().clone(),
        guess_policy: GUESS_POLICY.to_string(),
        answer_policy: ANSWER_POLICY.to_string(),
        guess_pool: guess_pool.len() as u64,
        answer_pool: answers.len() as u64,
        base_words,
        bases_outside_guess_pool: bases_outside,
        irregular_added,
        irregular_rejected,
        generated_at: expansion.generated_at.clone(),
    };
    write_manifest(&paths.file(POOL_POLICY), &manifest)?;

    info!(
        variant = %paths.variant(),
        commit = %paths.commit(),
        guesses = manifest.guess_pool,
        answers = manifest.answer_pool,
        "derived guess and answer pools"
    );
    Ok(manifest)
}

fn merge_irregulars(
    paths: &CommitDir,
    guess_pool: &BTreeSet<String>,
    answers: &mut BTreeSet<String>,
) -> Result<(u64, u64), PipelineError> {
    let path = paths.file(IRREGULAR_ALLOWLIST);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
        Err(err) => {
            return Err(PipelineError::Io {
                path,
                source: err,
            })
        }
    };
    let mut added = 0u64;
    let mut rejected = 0u64;
    for word in parse_word_list(&text).words {
        if guess_pool.contains(&word) {
            if answers.insert(word) {
                added += 1;
            }
        } else {
            rejected += 1;
        }
    }
    debug!(added, rejected, "merged irregular answer allowlist");
    Ok((added, rejected))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use lexi_domain::{CommitId, Variant};
    use tempfile::tempdir;

    use super::super::expand::expand_forms;
    use super::super::test_support::seed_sources;
    use super::*;

    fn paths(dir: &Path) -> CommitDir {
        CommitDir::new(dir, Variant::EnUs, CommitId::parse(&"ab".repeat(20)).unwrap())
    }

    fn run_expansion(paths: &CommitDir, dic: &str, aff: &str) {
        seed_sources(paths, dic, aff);
        expand_forms(paths).unwrap();
    }

    #[test]
    fn answer_pool_is_bases_intersected_with_guess_pool() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        run_expansion(&paths, "2\ndog/S\ncat\n", "SFX S Y 1\nSFX S 0 s .\n");
        let manifest = derive_pools(&paths).unwrap();

        let guesses = fs::read_to_string(paths.file(GUESS_POOL)).unwrap();
        let answers = fs::read_to_string(paths.file(ANSWER_POOL)).unwrap();
        assert_eq!(guesses, "CAT\nDOG\nDOGS\n");
        assert_eq!(answers, "CAT\nDOG\n");
        assert_eq!(manifest.guess_pool, 3);
        assert_eq!(manifest.answer_pool, 2);
        assert_eq!(manifest.bases_outside_guess_pool, 0);
    }

    #[test]
    fn base_missing_from_guess_pool_is_excluded_and_counted() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        run_expansion(&paths, "2\ndog/S\ncat\n", "SFX S Y 1\nSFX S 0 s .\n");
        // Simulate a guess pool that lost CAT between stages.
        fs::write(paths.file(EXPANDED_FORMS), "DOG\nDOGS\n").unwrap();
        let manifest = derive_pools(&paths).unwrap();
        assert_eq!(manifest.base_words, 2);
        assert_eq!(manifest.bases_outside_guess_pool, 1);
        let answers = fs::read_to_string(paths.file(ANSWER_POOL)).unwrap();
        assert_eq!(answers, "DOG\n");
    }

    #[test]
    fn irregular_allowlist_requires_guess_pool_membership() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        run_expansion(&paths, "2\ndog/S\ncat\n", "SFX S Y 1\nSFX S 0 s .\n");
        fs::write(
            paths.file(IRREGULAR_ALLOWLIST),
            "DOGS\nUNICORN\n",
        )
        .unwrap();
        let manifest = derive_pools(&paths).unwrap();
        assert_eq!(manifest.irregular_added, 1);
        assert_eq!(manifest.irregular_rejected, 1);
        let answers = fs::read_to_string(paths.file(ANSWER_POOL)).unwrap();
        assert_eq!(answers, "CAT\nDOG\nDOGS\n");
    }

    #[test]
    fn empty_answer_pool_fails_closed() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        // Bases are all too short; only suffixed forms survive expansion.
        run_expansion(&paths, "1\nax/X\n", "SFX X Y 1\nSFX X 0 le .\n");
        let err = derive_pools(&paths).unwrap_err();
        assert_eq!(err.code(), "ANSWER_POOL_EMPTY");
        assert!(!paths.file(ANSWER_POOL).exists());
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        run_expansion(&paths, "2\ndog/S\ncat\n", "SFX S Y 1\nSFX S 0 s .\n");
        derive_pools(&paths).unwrap();
        let a = (
            fs::read(paths.file(GUESS_POOL)).unwrap(),
            fs::read(paths.file(ANSWER_POOL)).unwrap(),
            fs::read(paths.file(POOL_POLICY)).unwrap(),
        );
        derive_pools(&paths).unwrap();
        let b = (
            fs::read(paths.file(GUESS_POOL)).unwrap(),
            fs::read(paths.file(ANSWER_POOL)).unwrap(),
            fs::read(paths.file(POOL_POLICY)).unwrap(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn missing_expansion_artifacts_are_reported() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        let err = derive_pools(&paths).unwrap_err();
        assert_eq!(err.code(), "MISSING_ARTIFACT");
    }
}

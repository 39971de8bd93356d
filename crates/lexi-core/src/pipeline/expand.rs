//! Morphological Expansion: base dictionary + affix rules → every valid
//! surface form that fits the playable-word shape.

use lexi_domain::affix;
use lexi_domain::manifest::{ExpansionManifest, SourceManifest, MANIFEST_SCHEMA_VERSION};
use lexi_domain::{normalize_word, render_word_list};
use tracing::info;

use super::paths::{CommitDir, AFF_FILE, DIC_FILE, EXPANDED_FORMS, EXPANSION_MANIFEST, SOURCE_MANIFEST};
use super::{check_provenance, read_file, read_manifest, sha256_hex, write_manifest, PipelineError};
use crate::fsx::write_atomic;

/// Runs the expansion stage for one (variant, commit).
///
/// The stage is pure given its on-disk inputs: output is deduplicated,
/// byte-sorted, and timestamped from the source manifest, so re-running on
/// unchanged inputs reproduces both artifacts byte for byte.
///
/// # Errors
///
/// Fails when the source manifest is missing or records a different
/// (variant, commit), when raw files drifted from their recorded digests,
/// or when the affix/dictionary sources are malformed.
pub fn expand_forms(paths: &CommitDir) -> Result<ExpansionManifest, PipelineError> {
    let source: SourceManifest = read_manifest(&paths.file(SOURCE_MANIFEST), "source manifest")?;
    check_provenance(source.variant, &source.commit, paths.variant(), paths.commit())?;

    let dic_text = verified_source(paths, &source, DIC_FILE)?;
    let aff_text = verified_source(paths, &source, AFF_FILE)?;

    let rules = affix::parse_affix(&aff_text).map_err(|err| PipelineError::ParseFailed {
        what: "affix rules",
        detail: err.to_string(),
    })?;
    let dictionary = affix::parse_dictionary(&dic_text).map_err(|err| {
        PipelineError::ParseFailed {
            what: "dictionary",
            detail: err.to_string(),
        }
    })?;

    let surface_forms = affix::expand(&dictionary, &rules);
    let mut kept = std::collections::BTreeSet::new();
    let mut dropped: u64 = 0;
    for form in &surface_forms {
        match normalize_word(form) {
            Some(word) => {
                kept.insert(word);
            }
            None => dropped += 1,
        }
    }
    if kept.is_empty() {
        return Err(PipelineError::GuessPoolEmpty);
    }

    write_atomic(
        &paths.file(EXPANDED_FORMS),
        render_word_list(&kept).as_bytes(),
    )?;

    let manifest = ExpansionManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        variant: paths.variant(),
        commit: paths.commit().clone(),
        entry_count: dictionary.entries.len() as u64,
        expanded_count: kept.len() as u64,
        dropped_count: dropped,
        // Derived from the fetch timestamp so re-runs stay byte-identical.
        generated_at: source.retrieved_at.clone(),
    };
    write_manifest(&paths.file(EXPANSION_MANIFEST), &manifest)?;

    info!(
        variant = %paths.variant(),
        commit = %paths.commit(),
        entries = manifest.entry_count,
        forms = manifest.expanded_count,
        dropped = manifest.dropped_count,
        "expanded dictionary into surface forms"
    );
    Ok(manifest)
}

fn verified_source(
    paths: &CommitDir,
    source: &SourceManifest,
    name: &str,
) -> Result<String, PipelineError> {
    let text = read_file(&paths.file(name))?;
    let recorded = source
        .file(name)
        .ok_or_else(|| PipelineError::MissingArtifact {
            file: name.to_string(),
        })?;
    let actual = sha256_hex(text.as_bytes());
    if recorded.sha256 != actual {
        return Err(PipelineError::ChecksumMismatch {
            file: name.to_string(),
            expected: recorded.sha256.clone(),
            actual,
        });
    }
    Ok(text)
}

//! Import orchestrator: runs the four pipeline stages as one tracked job.
//!
//! A single import runs at a time per data directory, enforced with an
//! exclusive lock file so the guarantee holds across processes. Every
//! stage transition is recorded in the jobs store before and after the
//! work, and a failed stage marks the job failed with the stable error
//! code of whatever went wrong.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use fs4::FileExt;
use lexi_domain::manifest::{
    AnswerFilterManifest, ExpansionManifest, FilterMode, PoolPolicyManifest, SourceManifest,
};
use lexi_domain::store::LanguageEntry;
use lexi_domain::{ChecksumHex, CommitId, Variant};
use tracing::{info, warn};

use crate::config::Config;
use crate::data_plane::DataPlane;
use crate::pipeline::expand::expand_forms;
use crate::pipeline::fetch::{fetch_and_verify, FetchRequest, Fetcher};
use crate::pipeline::filter::filter_answers;
use crate::pipeline::paths::CommitDir;
use crate::pipeline::pool::derive_pools;
use crate::pipeline::PipelineError;

const LOCK_FILE: &str = "import.lock";

/// Everything an operator supplies to import one dictionary revision.
#[derive(Clone, Debug)]
pub struct ImportRequest {
    pub variant: Variant,
    pub commit: CommitId,
    pub dic_sha256: ChecksumHex,
    pub aff_sha256: ChecksumHex,
    pub filter_mode: FilterMode,
    /// Activate the language once all four stages succeed.
    pub enable: bool,
    pub min_length: Option<u8>,
}

#[derive(Clone, Debug)]
pub struct ImportReport {
    pub job_id: u64,
    pub cache_hit: bool,
    pub source: SourceManifest,
    pub expansion: ExpansionManifest,
    pub pools: PoolPolicyManifest,
    pub filter: AnswerFilterManifest,
    pub enabled: Option<LanguageEntry>,
}

#[derive(Debug)]
struct ImportLock {
    file: File,
}

impl ImportLock {
    fn acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("opening import lock {}", path.display()))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(ImportLock { file }),
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                Err(PipelineError::ImportInProgress.into())
            }
            Err(err) => {
                Err(err).with_context(|| format!("locking import lock {}", path.display()))
            }
        }
    }
}

impl Drop for ImportLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!(error = %err, "failed to release import lock");
        }
    }
}

/// Runs Fetch&Verify, Morphological Expansion, Pool Policy, and the
/// Family-Safety Filter for one (variant, commit), tracked as a job.
///
/// # Errors
///
/// `IMPORT_IN_PROGRESS` when another import holds the lock; otherwise the
/// first stage failure, already recorded on the job.
pub fn run_import(
    plane: &DataPlane,
    config: &Config,
    fetcher: &dyn Fetcher,
    request: &ImportRequest,
) -> Result<ImportReport> {
    let _lock = ImportLock::acquire(plane.data_dir())?;

    let job = plane.jobs.enqueue(request.variant, request.commit.clone())?;
    plane.jobs.mark_running(job.id)?;
    info!(
        job = job.id,
        variant = %request.variant,
        commit = %request.commit,
        "import started"
    );

    match run_stages(plane, config, fetcher, request, job.id) {
        Ok(report) => {
            plane.jobs.mark_finished(job.id, None)?;
            info!(job = job.id, "import finished");
            Ok(report)
        }
        Err(err) => {
            let code = err
                .downcast_ref::<PipelineError>()
                .map_or("INTERNAL", PipelineError::code);
            plane.jobs.mark_finished(job.id, Some(code.to_string()))?;
            warn!(job = job.id, code, error = %err, "import failed");
            Err(err)
        }
    }
}

fn run_stages(
    plane: &DataPlane,
    config: &Config,
    fetcher: &dyn Fetcher,
    request: &ImportRequest,
    job_id: u64,
) -> Result<ImportReport> {
    let paths = CommitDir::new(plane.data_dir(), request.variant, request.commit.clone());

    let outcome = fetch_and_verify(
        &paths,
        fetcher,
        &config.upstream().base_url,
        &FetchRequest {
            dic_sha256: request.dic_sha256.clone(),
            aff_sha256: request.aff_sha256.clone(),
        },
    )?;
    let expansion = expand_forms(&paths)?;
    let pools = derive_pools(&paths)?;
    let filter = filter_answers(&paths, request.filter_mode)?;

    let enabled = if request.enable {
        Some(plane.enable_language(request.variant, &request.commit, request.min_length)?)
    } else {
        None
    };

    Ok(ImportReport {
        job_id,
        cache_hit: outcome.cache_hit,
        source: outcome.manifest,
        expansion,
        pools,
        filter,
        enabled,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lexi_domain::store::JobStatus;
    use tempfile::tempdir;

    use super::*;
    use crate::config::EnvSnapshot;
    use crate::pipeline::sha256_hex;

    const BASE: &str = "http://upstream.test";
    const DIC: &[u8] = b"2\ndog/S\ncat\n";
    const AFF: &[u8] = b"SFX S Y 1\nSFX S 0 s .\n";

    struct FakeFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    impl Fetcher for FakeFetcher {
        fn get(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| PipelineError::NotFound {
                    url: url.to_string(),
                })
        }
    }

    fn commit() -> CommitId {
        CommitId::parse(&"ab".repeat(20)).unwrap()
    }

    fn fetcher() -> FakeFetcher {
        let commit = commit();
        let mut responses = HashMap::new();
        responses.insert(
            format!("{BASE}/{commit}/dictionaries/en/index.dic"),
            DIC.to_vec(),
        );
        responses.insert(
            format!("{BASE}/{commit}/dictionaries/en/index.aff"),
            AFF.to_vec(),
        );
        FakeFetcher { responses }
    }

    fn request(enable: bool) -> ImportRequest {
        ImportRequest {
            variant: Variant::EnUs,
            commit: commit(),
            dic_sha256: ChecksumHex::parse(&sha256_hex(DIC)).unwrap(),
            aff_sha256: ChecksumHex::parse(&sha256_hex(AFF)).unwrap(),
            filter_mode: FilterMode::DenylistOnly,
            enable,
            min_length: Some(3),
        }
    }

    fn setup(dir: &Path) -> (DataPlane, Config) {
        let snapshot = EnvSnapshot::testing(&[
            ("LEXI_DATA_PATH", dir.to_str().unwrap()),
            ("LEXI_UPSTREAM_BASE", BASE),
        ]);
        let config = Config::from_snapshot(&snapshot).unwrap();
        let plane = DataPlane::open(&config).unwrap();
        (plane, config)
    }

    #[test]
    fn full_import_enables_the_language() {
        let dir = tempdir().unwrap();
        let (plane, config) = setup(dir.path());

        let report = run_import(&plane, &config, &fetcher(), &request(true)).unwrap();
        assert!(!report.cache_hit);
        assert_eq!(report.pools.guess_pool, 3);
        assert_eq!(report.filter.activated, 2);
        assert!(report.enabled.is_some());

        let jobs = plane.jobs.snapshot().unwrap();
        assert_eq!(jobs.jobs[0].status, JobStatus::Done);
        assert!(plane.catalog.snapshot().language("en-US").is_some());
    }

    #[test]
    fn import_without_enable_leaves_registry_untouched() {
        let dir = tempdir().unwrap();
        let (plane, config) = setup(dir.path());
        let report = run_import(&plane, &config, &fetcher(), &request(false)).unwrap();
        assert!(report.enabled.is_none());
        assert!(plane.registry.snapshot().unwrap().entry("en-US").is_none());
    }

    #[test]
    fn failed_stage_marks_the_job_with_its_code() {
        let dir = tempdir().unwrap();
        let (plane, config) = setup(dir.path());
        let mut bad = request(false);
        bad.aff_sha256 = ChecksumHex::parse(&"0".repeat(64)).unwrap();

        let err = run_import(&plane, &config, &fetcher(), &bad).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>().unwrap().code(),
            "CHECKSUM_MISMATCH"
        );
        let jobs = plane.jobs.snapshot().unwrap();
        assert_eq!(jobs.jobs[0].status, JobStatus::Failed);
        assert_eq!(jobs.jobs[0].error.as_deref(), Some("CHECKSUM_MISMATCH"));
    }

    #[test]
    fn rerun_after_success_is_a_cache_hit() {
        let dir = tempdir().unwrap();
        let (plane, config) = setup(dir.path());
        run_import(&plane, &config, &fetcher(), &request(false)).unwrap();
        let empty = FakeFetcher {
            responses: HashMap::new(),
        };
        let report = run_import(&plane, &config, &empty, &request(false)).unwrap();
        assert!(report.cache_hit);
    }

    #[test]
    fn second_concurrent_import_is_refused() {
        let dir = tempdir().unwrap();
        let (plane, _config) = setup(dir.path());
        let _held = ImportLock::acquire(plane.data_dir()).unwrap();
        let err = ImportLock::acquire(plane.data_dir()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>().unwrap().code(),
            "IMPORT_IN_PROGRESS"
        );
    }
}

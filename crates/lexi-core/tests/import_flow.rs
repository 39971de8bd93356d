//! End-to-end import over real HTTP against a local fake upstream.

use std::env;
use std::fs;

use httptest::{matchers::request, responders::status_code, Expectation, Server};
use lexi_core::{
    run_import, ChecksumHex, CommitDir, CommitId, Config, DataPlane, FilterMode, ImportRequest,
    JobStatus, PipelineError, SystemFetcher, Variant,
};
use serial_test::serial;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

const COMMIT: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const DIC_PATH: &str = "/aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa/dictionaries/en/index.dic";
const AFF_PATH: &str = "/aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa/dictionaries/en/index.aff";
const DIC: &[u8] = b"2\ndog/S\ncat\n";
const AFF: &[u8] = b"SFX S Y 1\nSFX S 0 s .\n";

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn request_for(enable: bool) -> ImportRequest {
    ImportRequest {
        variant: Variant::EnUs,
        commit: CommitId::parse(COMMIT).unwrap(),
        dic_sha256: ChecksumHex::parse(&sha256_hex(DIC)).unwrap(),
        aff_sha256: ChecksumHex::parse(&sha256_hex(AFF)).unwrap(),
        filter_mode: FilterMode::DenylistOnly,
        enable,
        min_length: Some(3),
    }
}

fn with_env(data_dir: &std::path::Path, base: &str) -> (DataPlane, Config, SystemFetcher) {
    env::set_var("LEXI_DATA_PATH", data_dir);
    env::set_var("LEXI_UPSTREAM_BASE", base);
    let config = Config::from_env().unwrap();
    env::remove_var("LEXI_DATA_PATH");
    env::remove_var("LEXI_UPSTREAM_BASE");
    let plane = DataPlane::open(&config).unwrap();
    let fetcher =
        SystemFetcher::new(config.network().timeout, config.network().online).unwrap();
    (plane, config, fetcher)
}

#[test]
#[serial]
fn import_downloads_verifies_and_enables() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", DIC_PATH))
            .respond_with(status_code(200).body(DIC)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", AFF_PATH))
            .respond_with(status_code(200).body(AFF)),
    );

    let dir = tempdir().unwrap();
    let (plane, config, fetcher) = with_env(dir.path(), server.url_str("").trim_end_matches('/'));

    let report = run_import(&plane, &config, &fetcher, &request_for(true)).unwrap();
    assert!(!report.cache_hit);
    assert_eq!(report.pools.answer_pool, 2);
    assert!(report.enabled.is_some());

    let paths = CommitDir::new(
        plane.data_dir(),
        Variant::EnUs,
        CommitId::parse(COMMIT).unwrap(),
    );
    let guesses = fs::read_to_string(paths.file("guess-pool.txt")).unwrap();
    assert_eq!(guesses, "CAT\nDOG\nDOGS\n");
    let active = fs::read_to_string(paths.file("answer-pool-active.txt")).unwrap();
    assert_eq!(active, "CAT\nDOG\n");

    let catalog = plane.catalog.snapshot();
    let lang = catalog.language("en-US").unwrap();
    assert_eq!(lang.dictionary_path, paths.file("guess-pool.txt"));

    let jobs = plane.jobs.snapshot().unwrap();
    assert_eq!(jobs.jobs.len(), 1);
    assert_eq!(jobs.jobs[0].status, JobStatus::Done);
}

#[test]
#[serial]
fn reimport_of_verified_sources_makes_no_requests() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", DIC_PATH))
            .times(1)
            .respond_with(status_code(200).body(DIC)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", AFF_PATH))
            .times(1)
            .respond_with(status_code(200).body(AFF)),
    );

    let dir = tempdir().unwrap();
    let (plane, config, fetcher) = with_env(dir.path(), server.url_str("").trim_end_matches('/'));

    run_import(&plane, &config, &fetcher, &request_for(false)).unwrap();
    let report = run_import(&plane, &config, &fetcher, &request_for(false)).unwrap();
    assert!(report.cache_hit);
}

#[test]
#[serial]
fn rate_limited_upstream_is_retriable_and_recorded() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", DIC_PATH))
            .respond_with(status_code(429)),
    );

    let dir = tempdir().unwrap();
    let (plane, config, fetcher) = with_env(dir.path(), server.url_str("").trim_end_matches('/'));

    let err = run_import(&plane, &config, &fetcher, &request_for(false)).unwrap_err();
    let pipeline = err.downcast_ref::<PipelineError>().unwrap();
    assert!(pipeline.retriable());
    assert_eq!(pipeline.code(), "UPSTREAM_RATE_LIMITED");

    let jobs = plane.jobs.snapshot().unwrap();
    assert_eq!(jobs.jobs[0].status, JobStatus::Failed);
    assert_eq!(
        jobs.jobs[0].error.as_deref(),
        Some("UPSTREAM_RATE_LIMITED")
    );
}

//! Fetch&Verify: download the pinned upstream sources and prove they are
//! the bytes the operator asked for.

use std::fs;
use std::time::Duration;

use lexi_domain::manifest::{SourceFile, SourceManifest, MANIFEST_SCHEMA_VERSION};
use lexi_domain::ChecksumHex;
use tracing::{debug, info};

use super::paths::{CommitDir, AFF_FILE, DIC_FILE, SOURCE_MANIFEST};
use super::{read_manifest, sha256_hex, write_manifest, PipelineError};
use crate::fsx::write_atomic;
use crate::timefmt;

pub const PROVIDER_ID: &str = "wooorm-dictionaries";
pub const REPOSITORY: &str = "wooorm/dictionaries";

const USER_AGENT: &str = concat!("lexi-import/", env!("CARGO_PKG_VERSION"));

/// Injectable HTTP capability so stage tests run against a local fake
/// server (or no server at all) instead of the real upstream.
pub trait Fetcher: Send + Sync {
    /// Fetches `url` fully into memory.
    ///
    /// # Errors
    ///
    /// Implementations classify failures: 404 is terminal, 429/5xx/timeouts
    /// and connection trouble are retriable.
    fn get(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Blocking `reqwest` fetcher with a bounded timeout.
pub struct SystemFetcher {
    client: reqwest::blocking::Client,
    online: bool,
}

impl SystemFetcher {
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot initialize.
    pub fn new(timeout: Duration, online: bool) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| PipelineError::Network {
                url: String::new(),
                detail: err.to_string(),
            })?;
        Ok(SystemFetcher { client, online })
    }
}

impl Fetcher for SystemFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        if !self.online {
            return Err(PipelineError::Offline {
                url: url.to_string(),
            });
        }
        let response = self.client.get(url).send().map_err(|err| {
            if err.is_timeout() {
                PipelineError::Timeout {
                    url: url.to_string(),
                }
            } else {
                PipelineError::Network {
                    url: url.to_string(),
                    detail: err.to_string(),
                }
            }
        })?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(PipelineError::NotFound {
                url: url.to_string(),
            });
        }
        if status.as_u16() == 429 {
            return Err(PipelineError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PipelineError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().map_err(|err| {
            if err.is_timeout() {
                PipelineError::Timeout {
                    url: url.to_string(),
                }
            } else {
                PipelineError::Network {
                    url: url.to_string(),
                    detail: err.to_string(),
                }
            }
        })?;
        Ok(bytes.to_vec())
    }
}

/// Expected digests for the two source files of one import.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub dic_sha256: ChecksumHex,
    pub aff_sha256: ChecksumHex,
}

#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub manifest: SourceManifest,
    /// True when verified artifacts were already on disk and no network
    /// traffic happened.
    pub cache_hit: bool,
}

/// Runs Fetch&Verify for one (variant, commit).
///
/// Fails closed on any digest disagreement; nothing is persisted unless
/// both files verified, so a rejected fetch leaves no partial state under
/// the commit directory. Re-running against already-verified artifacts is
/// a no-op cache hit.
///
/// # Errors
///
/// See [`PipelineError`]; transient upstream failures are retriable.
pub fn fetch_and_verify(
    paths: &CommitDir,
    fetcher: &dyn Fetcher,
    upstream_base: &str,
    request: &FetchRequest,
) -> Result<FetchOutcome, PipelineError> {
    if let Some(manifest) = existing_verified(paths, request) {
        debug!(
            variant = %paths.variant(),
            commit = %paths.commit(),
            "source artifacts already verified, skipping download"
        );
        return Ok(FetchOutcome {
            manifest,
            cache_hit: true,
        });
    }

    let dic_url = source_url(upstream_base, paths, DIC_FILE);
    let aff_url = source_url(upstream_base, paths, AFF_FILE);

    let dic_bytes = fetch_checked(fetcher, &dic_url, DIC_FILE, &request.dic_sha256)?;
    let aff_bytes = fetch_checked(fetcher, &aff_url, AFF_FILE, &request.aff_sha256)?;

    write_atomic(&paths.file(DIC_FILE), &dic_bytes)?;
    write_atomic(&paths.file(AFF_FILE), &aff_bytes)?;

    let manifest = SourceManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        provider_id: PROVIDER_ID.to_string(),
        repository: REPOSITORY.to_string(),
        variant: paths.variant(),
        commit: paths.commit().clone(),
        files: vec![
            SourceFile {
                name: DIC_FILE.to_string(),
                sha256: request.dic_sha256.as_str().to_string(),
                bytes: dic_bytes.len() as u64,
            },
            SourceFile {
                name: AFF_FILE.to_string(),
                sha256: request.aff_sha256.as_str().to_string(),
                bytes: aff_bytes.len() as u64,
            },
        ],
        retrieved_at: timefmt::utc_now(),
    };
    write_manifest(&paths.file(SOURCE_MANIFEST), &manifest)?;

    info!(
        variant = %paths.variant(),
        commit = %paths.commit(),
        dic_bytes = dic_bytes.len(),
        aff_bytes = aff_bytes.len(),
        "fetched and verified upstream sources"
    );
    Ok(FetchOutcome {
        manifest,
        cache_hit: false,
    })
}

fn fetch_checked(
    fetcher: &dyn Fetcher,
    url: &str,
    file: &str,
    expected: &ChecksumHex,
) -> Result<Vec<u8>, PipelineError> {
    let bytes = fetcher.get(url)?;
    let actual = sha256_hex(&bytes);
    if !expected.matches(&actual) {
        return Err(PipelineError::ChecksumMismatch {
            file: file.to_string(),
            expected: expected.as_str().to_string(),
            actual,
        });
    }
    Ok(bytes)
}

fn source_url(base: &str, paths: &CommitDir, file: &str) -> String {
    format!(
        "{base}/{}/dictionaries/{}/{file}",
        paths.commit(),
        paths.variant().upstream_dir()
    )
}

fn existing_verified(paths: &CommitDir, request: &FetchRequest) -> Option<SourceManifest> {
    let manifest: SourceManifest =
        read_manifest(&paths.file(SOURCE_MANIFEST), "source manifest").ok()?;
    if manifest.variant != paths.variant() || &manifest.commit != paths.commit() {
        return None;
    }
    for (name, expected) in [
        (DIC_FILE, &request.dic_sha256),
        (AFF_FILE, &request.aff_sha256),
    ] {
        let recorded = manifest.file(name)?;
        if recorded.sha256 != expected.as_str() {
            return None;
        }
        let bytes = fs::read(paths.file(name)).ok()?;
        if !expected.matches(&sha256_hex(&bytes)) {
            return None;
        }
    }
    Some(manifest)
}

//! Shared fixtures for stage tests: seeds a commit directory with raw
//! sources and a matching source manifest, as a completed fetch would.

use std::fs;

use lexi_domain::manifest::{SourceFile, SourceManifest, MANIFEST_SCHEMA_VERSION};

use super::paths::{CommitDir, AFF_FILE, DIC_FILE, SOURCE_MANIFEST};
use super::{sha256_hex, write_manifest};

pub(crate) fn seed_sources(paths: &CommitDir, dic: &str, aff: &str) {
    fs::create_dir_all(paths.dir()).unwrap();
    fs::write(paths.file(DIC_FILE), dic).unwrap();
    fs::write(paths.file(AFF_FILE), aff).unwrap();
    let manifest = SourceManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        provider_id: "wooorm-dictionaries".to_string(),
        repository: "wooorm/dictionaries".to_string(),
        variant: paths.variant(),
        commit: paths.commit().clone(),
        files: vec![
            SourceFile {
                name: DIC_FILE.to_string(),
                sha256: sha256_hex(dic.as_bytes()),
                bytes: dic.len() as u64,
            },
            SourceFile {
                name: AFF_FILE.to_string(),
                sha256: sha256_hex(aff.as_bytes()),
                bytes: aff.len() as u64,
            },
        ],
        retrieved_at: "2026-01-01T00:00:00.000Z".to_string(),
    };
    write_manifest(&paths.file(SOURCE_MANIFEST), &manifest).unwrap();
}

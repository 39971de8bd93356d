//! Atomic file writes.
//!
//! Every persistence path in the data plane funnels through
//! [`write_atomic`]: payload goes to a sibling temp file first, then a
//! rename swings it into place. Readers see either the old bytes or the new
//! bytes, never a torn file. A crash mid-write leaves the original intact
//! plus at most one orphan `*.tmp` sibling, which is tolerated drift.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Surfaced with code `WRITE_FAILED`; a store that swallowed one of these
/// would keep serving state it believes was persisted.
#[derive(Debug, thiserror::Error)]
#[error("atomic write failed for {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        "WRITE_FAILED"
    }
}

/// Writes `bytes` to `path` atomically.
///
/// # Errors
///
/// Returns [`WriteError`] wrapping the underlying I/O cause. The temp file
/// is best-effort removed before the error surfaces.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let tmp = temp_sibling(path);
    write_via_temp(path, &tmp, bytes).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        WriteError {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_via_temp(path: &Path, tmp: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(tmp, bytes)?;
    match fs::rename(tmp, path) {
        Ok(()) => Ok(()),
        Err(err) if rejects_overwrite(&err) => {
            // Some filesystems refuse rename-over-existing; drop the
            // destination and retry once.
            debug!(path = %path.display(), "rename rejected overwrite, retrying");
            fs::remove_file(path)?;
            fs::rename(tmp, path)
        }
        Err(err) => Err(err),
    }
}

fn rejects_overwrite(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::AlreadyExists | ErrorKind::PermissionDenied)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "payload".to_string());
    let suffix: u32 = rand::random();
    path.with_file_name(format!("{file_name}.{suffix:08x}.tmp"))
}

use std::path::Path;

use anyhow::{bail, Result};
use lexi_domain::store::{ImportJob, JobStatus, JobsState};
use lexi_domain::{CommitId, Variant};
use serde_json::Value;

use crate::docstore::{DocStore, StoreSchema};
use crate::timefmt;

impl StoreSchema for JobsState {
    const FILE_NAME: &'static str = "jobs.json";

    fn default_state() -> Self {
        JobsState::default_state()
    }

    fn normalize(raw: &Value) -> Self {
        JobsState::normalize(raw)
    }

    fn prune(&mut self) {
        JobsState::prune(self);
    }

    fn recover(&mut self) {
        self.fail_interrupted();
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn set_updated_at(&mut self, ts: String) {
        self.updated_at = ts;
    }
}

/// Admin import-job queue. Lifecycle transitions are persisted eagerly so
/// an operator polling the queue sees each state change even if the import
/// dies in between.
pub struct JobsStore {
    store: DocStore<JobsState>,
}

impl JobsStore {
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        JobsStore {
            store: DocStore::open(dir),
        }
    }

    /// # Errors
    ///
    /// Surfaces persistence failures; corrupt files are repaired silently.
    pub fn snapshot(&self) -> Result<JobsState> {
        self.store.snapshot()
    }

    /// # Errors
    ///
    /// Fails only on persistence failures.
    pub fn enqueue(&self, variant: Variant, commit: CommitId) -> Result<ImportJob> {
        let mut id = 0;
        let state = self.store.mutate(|state| {
            id = state.enqueue(variant, commit.clone(), timefmt::utc_now());
            Ok(())
        })?;
        let Some(job) = state.jobs.into_iter().find(|j| j.id == id) else {
            bail!("job {id} vanished after enqueue");
        };
        Ok(job)
    }

    /// # Errors
    ///
    /// Fails for unknown or non-queued jobs.
    pub fn mark_running(&self, id: u64) -> Result<()> {
        self.transition(id, |job| {
            if job.status != JobStatus::Queued {
                bail!("job {id} is {} and cannot start", job.status.as_str());
            }
            job.status = JobStatus::Running;
            job.started_at = Some(timefmt::utc_now());
            Ok(())
        })
    }

    /// Terminal transition; `error` selects between done and failed.
    ///
    /// # Errors
    ///
    /// Fails for unknown jobs or jobs that already finished.
    pub fn mark_finished(&self, id: u64, error: Option<String>) -> Result<()> {
        self.transition(id, |job| {
            if job.status.is_terminal() {
                bail!("job {id} already finished");
            }
            job.status = if error.is_some() {
                JobStatus::Failed
            } else {
                JobStatus::Done
            };
            job.finished_at = Some(timefmt::utc_now());
            job.error = error.clone();
            Ok(())
        })
    }

    fn transition(
        &self,
        id: u64,
        apply: impl Fn(&mut ImportJob) -> Result<()>,
    ) -> Result<()> {
        self.store.mutate(|state| {
            let Some(job) = state.job_mut(id) else {
                bail!("unknown job {id}");
            };
            apply(job)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn commit() -> CommitId {
        CommitId::parse(&"ef".repeat(20)).unwrap()
    }

    #[test]
    fn lifecycle_reaches_done() {
        let dir = tempdir().unwrap();
        let store = JobsStore::open(dir.path());
        let job = store.enqueue(Variant::EnUs, commit()).unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        store.mark_running(job.id).unwrap();
        store.mark_finished(job.id, None).unwrap();

        let state = store.snapshot().unwrap();
        let stored = &state.jobs[0];
        assert_eq!(stored.status, JobStatus::Done);
        assert!(stored.started_at.is_some());
        assert!(stored.finished_at.is_some());
        assert!(stored.error.is_none());
    }

    #[test]
    fn failure_records_the_error() {
        let dir = tempdir().unwrap();
        let store = JobsStore::open(dir.path());
        let job = store.enqueue(Variant::DeDe, commit()).unwrap();
        store.mark_running(job.id).unwrap();
        store
            .mark_finished(job.id, Some("CHECKSUM_MISMATCH".to_string()))
            .unwrap();
        let state = store.snapshot().unwrap();
        assert_eq!(state.jobs[0].status, JobStatus::Failed);
        assert_eq!(state.jobs[0].error.as_deref(), Some("CHECKSUM_MISMATCH"));
    }

    #[test]
    fn double_start_is_rejected() {
        let dir = tempdir().unwrap();
        let store = JobsStore::open(dir.path());
        let job = store.enqueue(Variant::EnUs, commit()).unwrap();
        store.mark_running(job.id).unwrap();
        assert!(store.mark_running(job.id).is_err());
    }

    #[test]
    fn running_job_is_failed_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = JobsStore::open(dir.path());
            let job = store.enqueue(Variant::EnUs, commit()).unwrap();
            store.mark_running(job.id).unwrap();
        }
        let store = JobsStore::open(dir.path());
        let state = store.snapshot().unwrap();
        assert_eq!(state.jobs[0].status, JobStatus::Failed);
        assert!(state.jobs[0].error.as_deref().unwrap().contains("restart"));
    }
}

//! Admin import-job queue snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{timestamp_or_epoch, EPOCH};
use crate::revision::CommitId;
use crate::variant::Variant;

pub const JOBS_SCHEMA_VERSION: u32 = 1;

/// Completed jobs past this cap are pruned oldest-first (id tie-break);
/// queued and running jobs are never evicted.
pub const MAX_JOBS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: u64,
    pub variant: Variant,
    pub commit: CommitId,
    pub status: JobStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsState {
    pub schema_version: u32,
    pub updated_at: String,
    pub next_id: u64,
    pub jobs: Vec<ImportJob>,
}

impl JobsState {
    #[must_use]
    pub fn default_state() -> Self {
        JobsState {
            schema_version: JOBS_SCHEMA_VERSION,
            updated_at: EPOCH.to_string(),
            next_id: 1,
            jobs: Vec::new(),
        }
    }

    /// Rebuilds a valid queue from untrusted JSON. Jobs with unknown
    /// variants, bad commits, or duplicate ids are dropped; `next_id` is
    /// advanced past every surviving id so ids stay unique forever.
    #[must_use]
    pub fn normalize(raw: &Value) -> Self {
        let mut state = JobsState::default_state();
        state.updated_at = timestamp_or_epoch(raw, "updatedAt");
        if let Some(jobs) = raw.get("jobs").and_then(Value::as_array) {
            for value in jobs {
                let Ok(job) = serde_json::from_value::<ImportJob>(value.clone()) else {
                    continue;
                };
                if state.jobs.iter().any(|j| j.id == job.id) {
                    continue;
                }
                state.jobs.push(job);
            }
        }
        state.jobs.sort_by_key(|j| j.id);
        let max_id = state.jobs.iter().map(|j| j.id).max().unwrap_or(0);
        let stored_next = raw.get("nextId").and_then(Value::as_u64).unwrap_or(1);
        state.next_id = stored_next.max(max_id + 1).max(1);
        state
    }

    /// Fails every job still marked running. A job that was mid-flight when
    /// the process died can never complete; callers run this once per load
    /// so it surfaces instead of showing running forever.
    pub fn fail_interrupted(&mut self) {
        for job in &mut self.jobs {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Failed;
                job.error
                    .get_or_insert_with(|| "interrupted by restart".to_string());
            }
        }
    }

    /// Appends a queued job and returns its id.
    pub fn enqueue(&mut self, variant: Variant, commit: CommitId, created_at: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(ImportJob {
            id,
            variant,
            commit,
            status: JobStatus::Queued,
            created_at,
            started_at: None,
            finished_at: None,
            error: None,
        });
        id
    }

    #[must_use]
    pub fn job_mut(&mut self, id: u64) -> Option<&mut ImportJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn prune(&mut self) {
        let over = self.jobs.len().saturating_sub(MAX_JOBS);
        if over == 0 {
            return;
        }
        let mut victims: Vec<(String, u64)> = self
            .jobs
            .iter()
            .filter(|j| j.status.is_terminal())
            .map(|j| (j.created_at.clone(), j.id))
            .collect();
        victims.sort();
        let doomed: Vec<u64> = victims.into_iter().take(over).map(|(_, id)| id).collect();
        self.jobs.retain(|j| !doomed.contains(&j.id));
    }
}

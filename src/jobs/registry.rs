//! Process-lifetime job status table
//!
//! Owned explicitly and passed to the runtime and to status readers. The
//! Running state doubles as the overlap guard: `try_begin` refuses a job that
//! has not finished yet.

use crate::jobs::types::JobName;
use crate::models::{JobState, JobStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct JobRegistry {
    statuses: Arc<RwLock<BTreeMap<JobName, JobStatus>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(RwLock::new(Self::initial())),
        }
    }

    fn initial() -> BTreeMap<JobName, JobStatus> {
        JobName::all()
            .iter()
            .map(|&job| (job, JobStatus::idle(job.display_name())))
            .collect()
    }

    /// Flip to Running unless the job is already running
    pub async fn try_begin(&self, job: JobName) -> bool {
        let mut statuses = self.statuses.write().await;
        let status = statuses
            .entry(job)
            .or_insert_with(|| JobStatus::idle(job.display_name()));
        if status.state == JobState::Running {
            return false;
        }
        status.state = JobState::Running;
        true
    }

    pub async fn finish_ok(&self, job: JobName, at: DateTime<Utc>, outcome: impl Into<String>) {
        let mut statuses = self.statuses.write().await;
        if let Some(status) = statuses.get_mut(&job) {
            status.state = JobState::Ok;
            status.last_run = Some(at);
            status.last_outcome = Some(outcome.into());
            status.last_error = None;
        }
    }

    pub async fn finish_failed(&self, job: JobName, at: DateTime<Utc>, error: impl Into<String>) {
        let mut statuses = self.statuses.write().await;
        if let Some(status) = statuses.get_mut(&job) {
            status.state = JobState::Failed;
            status.last_run = Some(at);
            status.last_outcome = None;
            status.last_error = Some(error.into());
        }
    }

    pub async fn status(&self, job: JobName) -> JobStatus {
        self.statuses
            .read()
            .await
            .get(&job)
            .cloned()
            .unwrap_or_else(|| JobStatus::idle(job.display_name()))
    }

    /// All statuses in job order
    pub async fn snapshot(&self) -> Vec<JobStatus> {
        self.statuses.read().await.values().cloned().collect()
    }

    pub async fn reset(&self) {
        *self.statuses.write().await = Self::initial();
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

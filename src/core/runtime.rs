//! Tracked job execution: status bookkeeping, overlap guard, fault isolation

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::registry::JobRegistry;
use crate::jobs::types::{JobName, JobOutcome};
use crate::models::JobStatus;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// What happened to one requested run
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Finished(JobOutcome),
    Failed(String),
    /// The previous run of this job had not finished
    AlreadyRunning,
}

#[derive(Clone)]
pub struct PipelineRuntime {
    ctx: Arc<JobContext>,
    registry: JobRegistry,
}

impl PipelineRuntime {
    pub fn new(ctx: Arc<JobContext>, registry: JobRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn context(&self) -> &Arc<JobContext> {
        &self.ctx
    }

    /// Run a job to completion and record its status.
    ///
    /// The handler runs in its own task so that a panic is recorded as a
    /// failure instead of unwinding into the caller. Never returns an error.
    pub async fn run(&self, job: JobName) -> RunReport {
        if !self.registry.try_begin(job).await {
            warn!(job = %job, "Job {} is still running, skipping this run", job);
            self.record_metric(job, "overlap");
            return RunReport::AlreadyRunning;
        }

        info!(job = %job, "Starting job: {}", job);
        let start = Instant::now();
        let ctx = self.ctx.clone();
        let result = tokio::spawn(async move { handlers::run_job(job, &ctx).await }).await;
        let elapsed = start.elapsed();

        if let Some(ref metrics) = self.ctx.metrics {
            metrics
                .job_duration_seconds
                .with_label_values(&[job.slug()])
                .observe(elapsed.as_secs_f64());
        }

        let finished_at = Utc::now();
        match result {
            Ok(Ok(outcome)) => {
                let summary = outcome.summary();
                self.registry.finish_ok(job, finished_at, summary.clone()).await;
                self.record_metric(job, outcome.label());
                info!(
                    job = %job,
                    elapsed_ms = elapsed.as_millis() as u64,
                    outcome = %summary,
                    "Finished job: {}",
                    job
                );
                RunReport::Finished(outcome)
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                self.registry.finish_failed(job, finished_at, message.clone()).await;
                self.record_metric(job, "failed");
                error!(job = %job, error = %message, "Job failed: {}", job);
                RunReport::Failed(message)
            }
            Err(join_error) => {
                let message = describe_join_error(join_error);
                self.registry.finish_failed(job, finished_at, message.clone()).await;
                self.record_metric(job, "failed");
                error!(job = %job, error = %message, "Job aborted: {}", job);
                RunReport::Failed(message)
            }
        }
    }

    /// Start a run in the background and return immediately
    pub fn trigger(&self, job: JobName) -> JoinHandle<RunReport> {
        let runtime = self.clone();
        tokio::spawn(async move { runtime.run(job).await })
    }

    pub async fn statuses(&self) -> Vec<JobStatus> {
        self.registry.snapshot().await
    }

    fn record_metric(&self, job: JobName, outcome: &str) {
        if let Some(ref metrics) = self.ctx.metrics {
            metrics
                .job_runs_total
                .with_label_values(&[job.slug(), outcome])
                .inc();
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("job panicked: {}", detail)
    } else {
        "job task was cancelled".to_string()
    }
}

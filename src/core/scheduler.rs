//! Cron-based scheduler: one loop per job, each tick triggers a tracked run

use crate::config::JobSchedules;
use crate::core::runtime::PipelineRuntime;
use crate::error::{PipelineError, Result};
use crate::jobs::types::JobName;
use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct JobScheduler {
    runtime: PipelineRuntime,
    schedules: Vec<(JobName, Schedule)>,
    timezone: Tz,
    handles: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl JobScheduler {
    /// Parse every job's cron expression; evaluated in `timezone`
    pub fn new(runtime: PipelineRuntime, schedules: &JobSchedules, timezone: Tz) -> Result<Self> {
        let parsed = JobName::all()
            .iter()
            .map(|&job| {
                let expr = schedules.expression(job);
                Schedule::from_str(expr)
                    .map(|schedule| (job, schedule))
                    .map_err(|e| {
                        PipelineError::Config(format!(
                            "Invalid cron expression '{}' for {}: {}",
                            expr, job, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        for &job in JobName::all() {
            info!(job = %job, cron = %schedules.expression(job), "JobScheduler: {} on '{}'", job, schedules.expression(job));
        }

        Ok(Self {
            runtime,
            schedules: parsed,
            timezone,
            handles: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// Spawn one cron loop per job
    pub async fn start(&self) {
        let mut handles = self.handles.write().await;
        for (job, schedule) in &self.schedules {
            let job = *job;
            let schedule = schedule.clone();
            let runtime = self.runtime.clone();
            let timezone = self.timezone;

            handles.push(tokio::spawn(async move {
                loop {
                    let Some(next_tick) = schedule.upcoming(timezone).next() else {
                        warn!(job = %job, "JobScheduler: no upcoming time for {}, retrying in 60s", job);
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        continue;
                    };
                    let now = Utc::now().with_timezone(&timezone);
                    if next_tick > now {
                        let wait = (next_tick - now).to_std().unwrap_or_default();
                        debug!(job = %job, next = %next_tick, "JobScheduler: next {} run at {}", job, next_tick);
                        tokio::time::sleep(wait).await;
                    }

                    // Fire-and-forget
                    let _ = runtime.trigger(job);
                }
            }));
        }
        info!(jobs = handles.len(), "JobScheduler: started");
    }

    pub async fn stop(&self) {
        let mut handles = self.handles.write().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("JobScheduler: stopped");
    }

    pub async fn is_running(&self) -> bool {
        !self.handles.read().await.is_empty()
    }
}

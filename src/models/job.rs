//! Job run status as exposed to callers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Idle,
    Running,
    #[serde(rename = "OK")]
    Ok,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "Idle",
            JobState::Running => "Running",
            JobState::Ok => "OK",
            JobState::Failed => "Failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub name: String,
    pub state: JobState,
    pub last_run: Option<DateTime<Utc>>,
    /// Short summary of the last successful run
    pub last_outcome: Option<String>,
    pub last_error: Option<String>,
}

impl JobStatus {
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: JobState::Idle,
            last_run: None,
            last_outcome: None,
            last_error: None,
        }
    }
}

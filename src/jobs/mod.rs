//! Scheduled jobs: identities, status registry, context and handlers

pub mod context;
pub mod handlers;
pub mod registry;
pub mod types;

pub use context::{Clock, FixedClock, JobContext, SystemClock};
pub use registry::JobRegistry;
pub use types::{JobName, JobOutcome};

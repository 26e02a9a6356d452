mod inflight;
mod scheduler;
mod service;

pub use inflight::{InFlight, InFlightGuard};
pub use scheduler::{
    METRIC_JOBS_COMPLETED, METRIC_JOBS_FAILED, METRIC_SCHEDULER_BUSY, Scheduler, TickOutcome,
};
pub use service::{JobError, JobService};

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use metrics::counter;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        render::{RenderRequest, RenderService},
        repos::{JobStore, RepoError},
    },
    domain::{entities::JobRecord, types::StatusUpdate},
};

use super::inflight::InFlight;

pub const METRIC_JOBS_COMPLETED: &str = "spiralpress_jobs_completed_total";
pub const METRIC_JOBS_FAILED: &str = "spiralpress_jobs_failed_total";
pub const METRIC_SCHEDULER_BUSY: &str = "spiralpress_scheduler_busy_total";

const OUTCOME_WRITE_ATTEMPTS: u32 = 3;
const OUTCOME_WRITE_BACKOFF: Duration = Duration::from_millis(100);

/// What a single scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A render was already in flight; nothing was read or written.
    Busy,
    /// No pending job was waiting.
    Idle,
    Completed(Uuid),
    Failed(Uuid),
    /// The job store could not be read or written. Pending jobs are retried
    /// on a later tick.
    StoreUnavailable,
}

/// Polling scheduler that drives pending jobs through the render unit one at
/// a time, oldest first.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    renderer: Arc<dyn RenderService>,
    poll_interval: Duration,
    in_flight: InFlight,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        renderer: Arc<dyn RenderService>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            renderer,
            poll_interval,
            in_flight: InFlight::new(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Return every job left in `processing` by a previous run to `pending`.
    ///
    /// Must run before the first tick; nothing is rendered at startup, so
    /// any `processing` record belongs to a crashed process.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> Result<u64, RepoError> {
        let reset = self.store.reset_all_processing_to_pending().await?;
        if reset > 0 {
            warn!(reset, "Returned interrupted jobs to the pending queue");
        } else {
            debug!("No interrupted jobs to recover");
        }
        Ok(reset)
    }

    /// Run one scheduling step.
    pub async fn tick(&self) -> TickOutcome {
        let Some(_guard) = self.in_flight.try_acquire() else {
            counter!(METRIC_SCHEDULER_BUSY).increment(1);
            debug!("Render in flight; skipping tick");
            return TickOutcome::Busy;
        };

        let job = match self.store.find_oldest_pending().await {
            Ok(Some(job)) => job,
            Ok(None) => return TickOutcome::Idle,
            Err(err) => {
                warn!(error = %err, "Failed to look up pending jobs");
                return TickOutcome::StoreUnavailable;
            }
        };

        self.process(job).await
    }

    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn process(&self, job: JobRecord) -> TickOutcome {
        let JobRecord { id, content, .. } = job;

        if let Err(err) = self.store.update_status(id, StatusUpdate::Processing).await {
            warn!(error = %err, "Failed to claim job; leaving it pending");
            return TickOutcome::StoreUnavailable;
        }
        info!("Rendering job");

        let (update, outcome) = match self.renderer.render(RenderRequest::new(id, content)).await
        {
            Ok(artifact) => {
                info!(
                    artifact_ref = %artifact.reference,
                    pages = artifact.pages,
                    size_bytes = artifact.size_bytes,
                    "Render completed"
                );
                (
                    StatusUpdate::Completed {
                        artifact_ref: artifact.reference,
                    },
                    TickOutcome::Completed(id),
                )
            }
            Err(err) => {
                warn!(error = %err, "Render failed");
                (
                    StatusUpdate::Failed {
                        error_detail: err.to_string(),
                    },
                    TickOutcome::Failed(id),
                )
            }
        };

        if !self.record_outcome(id, update).await {
            return TickOutcome::StoreUnavailable;
        }

        match outcome {
            TickOutcome::Completed(_) => counter!(METRIC_JOBS_COMPLETED).increment(1),
            TickOutcome::Failed(_) => counter!(METRIC_JOBS_FAILED).increment(1),
            _ => {}
        }
        outcome
    }

    /// Write the terminal status, retrying a few times. A job whose outcome
    /// cannot be written stays `processing` until the next startup recovery.
    async fn record_outcome(&self, id: Uuid, update: StatusUpdate) -> bool {
        for attempt in 1..=OUTCOME_WRITE_ATTEMPTS {
            match self.store.update_status(id, update.clone()).await {
                Ok(_) => return true,
                Err(err) if attempt < OUTCOME_WRITE_ATTEMPTS => {
                    warn!(error = %err, attempt, "Failed to record job outcome; retrying");
                    sleep(OUTCOME_WRITE_BACKOFF * attempt).await;
                }
                Err(err) => {
                    error!(
                        error = %err,
                        status = %update.target(),
                        "Giving up on recording job outcome; job stays processing until restart"
                    );
                }
            }
        }
        false
    }

    /// Start the polling loop. Each tick runs in its own task so a slow
    /// render never delays the timer; overlapping ticks observe the
    /// in-flight slot and return [`TickOutcome::Busy`].
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                poll_interval_ms = self.poll_interval.as_millis() as u64,
                "Scheduler started"
            );

            loop {
                ticker.tick().await;
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    if AssertUnwindSafe(scheduler.tick())
                        .catch_unwind()
                        .await
                        .is_err()
                    {
                        error!("Scheduler tick panicked");
                    }
                });
            }
        })
    }
}

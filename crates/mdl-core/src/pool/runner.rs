use async_trait::async_trait;

use crate::error::MdlError;
use crate::events::{EventBus, JobEvent, LogStream};
use crate::model::{DownloadOutcome, Job, JobId};
use crate::progress::ProgressSnapshot;

/// The job-execution callback the pool wraps with retry.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Execute one attempt of `job`. Progress and raw log lines go through `ctx`.
    async fn run_attempt(&self, job: &Job, ctx: &AttemptContext)
        -> Result<DownloadOutcome, MdlError>;
}

/// Per-attempt handle for reporting telemetry onto the pool's bus.
#[derive(Clone)]
pub struct AttemptContext {
    job_id: JobId,
    attempt: u32,
    bus: EventBus,
}

impl AttemptContext {
    pub(crate) fn new(job_id: JobId, attempt: u32, bus: EventBus) -> Self {
        Self {
            job_id,
            attempt,
            bus,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn progress(&self, snapshot: ProgressSnapshot) {
        self.bus.emit(JobEvent::Progress {
            job_id: self.job_id,
            snapshot,
        });
    }

    pub fn log(&self, stream: LogStream, message: impl Into<String>) {
        self.bus.emit(JobEvent::Log {
            job_id: self.job_id,
            stream,
            message: message.into(),
        });
    }
}

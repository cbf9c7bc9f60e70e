//! Lifecycle events and the broadcast bus that fans them out.
//!
//! The worker pool emits; any number of consumers (CLI printer, JSON encoder,
//! tests) subscribe. Each subscriber owns an unbounded channel so a slow
//! consumer never causes an event to be dropped for the others.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{JobId, JobResult, Provider};
use crate::progress::ProgressSnapshot;

/// Which subprocess stream a raw log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Started {
        job_id: JobId,
        provider: Provider,
        attempt: u32,
    },
    Progress {
        job_id: JobId,
        snapshot: ProgressSnapshot,
    },
    Retry {
        job_id: JobId,
        attempt: u32,
        reason: String,
        next_delay_ms: u64,
    },
    Completed {
        job_id: JobId,
        result: JobResult,
    },
    Failed {
        job_id: JobId,
        result: JobResult,
    },
    Log {
        job_id: JobId,
        stream: LogStream,
        message: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Started { job_id, .. }
            | JobEvent::Progress { job_id, .. }
            | JobEvent::Retry { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. }
            | JobEvent::Log { job_id, .. } => *job_id,
        }
    }

    /// `completed` or `failed`: nothing follows for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed { .. } | JobEvent::Failed { .. })
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<JobEvent>;

/// Fan-out of [`JobEvent`]s to zero or more subscribers. Cheap to clone;
/// clones share the subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<JobEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber; closed receivers are pruned.
    pub fn emit(&self, event: JobEvent) {
        tracing::debug!(job_id = %event.job_id(), ?event, "job event");
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<JobEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

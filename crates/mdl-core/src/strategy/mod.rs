//! Download strategies: how one job becomes one subprocess invocation.
//!
//! A [`DownloadStrategy`] answers three questions for a job: can it handle it,
//! what exact command line runs it, and how that command is executed with
//! progress streamed back. [`StrategyRegistry`] picks the strategy per job.

mod guard;
mod process;
mod quality;
mod registry;
mod ytdlp;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::MdlError;
use crate::events::LogStream;
use crate::model::{DownloadOutcome, Job, JobId, Provider};
use crate::pool::AttemptContext;
use crate::progress::ProgressSnapshot;

pub use process::{execute, STDERR_TAIL_LINES};
pub use quality::{format_selection, parse_quality, FormatSelection, Quality};
pub use registry::StrategyRegistry;
pub use ytdlp::{GenericStrategy, ProviderStrategy, DEFAULT_FILENAME_TEMPLATE};

/// Fully resolved command line for one attempt. Built fresh per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInvocation {
    pub job_id: JobId,
    pub provider: Provider,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Error)]
#[error("sink rejected event: {0}")]
pub struct SinkError(pub String);

/// Receives parsed progress while a download runs.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, snapshot: ProgressSnapshot) -> Result<(), SinkError>;
}

/// Receives raw subprocess output lines.
pub trait LogSink: Send + Sync {
    fn log(&self, stream: LogStream, line: &str) -> Result<(), SinkError>;
}

impl ProgressSink for AttemptContext {
    fn progress(&self, snapshot: ProgressSnapshot) -> Result<(), SinkError> {
        AttemptContext::progress(self, snapshot);
        Ok(())
    }
}

impl LogSink for AttemptContext {
    fn log(&self, stream: LogStream, line: &str) -> Result<(), SinkError> {
        AttemptContext::log(self, stream, line);
        Ok(())
    }
}

#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Pure predicate: whether this strategy wants `job`.
    fn can_handle(&self, job: &Job) -> bool;

    /// Translate `job` into a command line. Fails only with `InvalidInput`.
    fn prepare(&self, job: &Job) -> Result<PreparedInvocation, MdlError>;

    /// Run `prepared` to completion. The child process never outlives this call.
    async fn download(
        &self,
        prepared: &PreparedInvocation,
        progress: &dyn ProgressSink,
        log: Option<&dyn LogSink>,
    ) -> Result<DownloadOutcome, MdlError>;
}

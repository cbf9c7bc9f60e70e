//! Per-job retry state machine.
//!
//! `started → (progress)* → (retry → started → (progress)*)* → completed | failed`

use std::sync::Arc;
use std::time::Instant;

use crate::error::MdlError;
use crate::events::{EventBus, JobEvent};
use crate::model::{DownloadOutcome, Job, JobResult};
use crate::retry::{RetryDecision, RetryPolicy};

use super::runner::{AttemptContext, JobRunner};
use super::PoolConfig;

pub(super) async fn run_job(
    job: Job,
    runner: Arc<dyn JobRunner>,
    bus: &EventBus,
    config: &PoolConfig,
) -> JobResult {
    let policy = RetryPolicy {
        max_attempts: job.request.retries.saturating_add(1),
        base_delay: config.base_delay,
        jitter: config.jitter,
    };
    let job = Arc::new(job);
    let started_at = Instant::now();
    let mut attempt = 1u32;

    loop {
        bus.emit(JobEvent::Started {
            job_id: job.id,
            provider: job.provider,
            attempt,
        });

        let ctx = AttemptContext::new(job.id, attempt, bus.clone());
        match run_attempt(Arc::clone(&job), Arc::clone(&runner), ctx).await {
            Ok(outcome) => {
                let result = JobResult {
                    job_id: job.id,
                    success: true,
                    provider: job.provider,
                    file_path: outcome.file_path,
                    elapsed: started_at.elapsed(),
                    attempts: attempt,
                    error: None,
                };
                tracing::info!(job_id = %job.id, attempts = attempt, "job completed");
                bus.emit(JobEvent::Completed {
                    job_id: job.id,
                    result: result.clone(),
                });
                return result;
            }
            Err(err) => {
                let reason = err.to_string();
                match policy.decide(attempt, err.is_retryable()) {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::warn!(
                            job_id = %job.id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %reason,
                            "attempt failed, retrying"
                        );
                        bus.emit(JobEvent::Retry {
                            job_id: job.id,
                            attempt,
                            reason,
                            next_delay_ms: delay.as_millis() as u64,
                        });
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::NoRetry => {
                        let result = JobResult {
                            job_id: job.id,
                            success: false,
                            provider: job.provider,
                            file_path: None,
                            elapsed: started_at.elapsed(),
                            attempts: attempt,
                            error: Some(reason),
                        };
                        tracing::info!(job_id = %job.id, attempts = attempt, "job failed");
                        bus.emit(JobEvent::Failed {
                            job_id: job.id,
                            result: result.clone(),
                        });
                        return result;
                    }
                }
            }
        }
    }
}

/// Runs the attempt on its own task so a panicking runner fails the job
/// instead of taking the worker down with it.
async fn run_attempt(
    job: Arc<Job>,
    runner: Arc<dyn JobRunner>,
    ctx: AttemptContext,
) -> Result<DownloadOutcome, MdlError> {
    let handle = tokio::spawn(async move { runner.run_attempt(&job, &ctx).await });
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(MdlError::download("job runner panicked")),
        Err(e) => Err(MdlError::download(format!("attempt task failed: {e}"))),
    }
}

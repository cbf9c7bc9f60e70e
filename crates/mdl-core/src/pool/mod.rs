//! Bounded-parallelism job execution with per-job retry.
//!
//! A fixed group of tokio workers pops jobs FIFO from one shared queue until
//! it is empty. Each worker drives a job to its terminal state (see
//! [`worker`]) before taking the next, so attempts of one job never overlap.

mod runner;
mod worker;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::events::EventBus;
use crate::model::{Job, JobResult};
use crate::retry::{Jitter, DEFAULT_BASE_DELAY};

pub use runner::{AttemptContext, JobRunner};

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Requested concurrency; clamped to `1..=job_count` per run.
    pub workers: usize,
    pub base_delay: Duration,
    pub jitter: Jitter,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: Jitter::Uniform,
        }
    }
}

/// Terminal results of one run, ordered by job id.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<JobResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// `max(1, min(configured, job_count or 1))`.
pub fn effective_workers(configured: usize, job_count: usize) -> usize {
    configured.min(job_count.max(1)).max(1)
}

pub struct WorkerPool {
    config: PoolConfig,
    bus: EventBus,
}

impl WorkerPool {
    pub fn new(config: PoolConfig, bus: EventBus) -> Self {
        Self { config, bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run every job to a terminal state. Never fails: per-job failures are
    /// reported through `failed` events and the summary.
    pub async fn run(&self, jobs: Vec<Job>, runner: Arc<dyn JobRunner>) -> RunSummary {
        let workers = effective_workers(self.config.workers, jobs.len());
        let queue: Arc<Mutex<VecDeque<Job>>> = Arc::new(Mutex::new(jobs.into_iter().collect()));
        tracing::debug!(workers, "starting worker pool");

        let mut join_set = tokio::task::JoinSet::new();
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let runner = Arc::clone(&runner);
            let bus = self.bus.clone();
            let config = self.config;
            join_set.spawn(async move {
                let mut done = Vec::new();
                while let Some(job) = pop_next(&queue) {
                    tracing::debug!(worker = worker_id, job_id = %job.id, "worker picked job");
                    done.push(worker::run_job(job, Arc::clone(&runner), &bus, &config).await);
                }
                done
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(done) => results.extend(done),
                Err(e) => tracing::error!(error = %e, "worker task join failed"),
            }
        }
        results.sort_by_key(|r| r.job_id);
        RunSummary { results }
    }
}

fn pop_next(queue: &Mutex<VecDeque<Job>>) -> Option<Job> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

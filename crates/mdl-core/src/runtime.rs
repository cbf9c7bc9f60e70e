//! Top-level entry: bootstrap dependencies, validate requests, run the pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::MdlConfig;
use crate::deps::{DependencyResolver, Toolchain};
use crate::error::MdlError;
use crate::events::{EventBus, EventReceiver};
use crate::model::{DownloadOutcome, Job, JobId, Request};
use crate::pool::{AttemptContext, JobRunner, PoolConfig, RunSummary, WorkerPool};
use crate::retry::{Jitter, DEFAULT_BASE_DELAY};
use crate::strategy::{LogSink, StrategyRegistry};

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub workers: usize,
    pub base_delay: Duration,
    pub jitter: Jitter,
    /// Forward every downloader output line as a `log` event.
    pub raw_log: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: Jitter::Uniform,
            raw_log: false,
        }
    }
}

impl RuntimeOptions {
    pub fn from_config(cfg: &MdlConfig) -> Self {
        Self {
            workers: cfg.workers,
            base_delay: cfg.base_delay(),
            raw_log: cfg.raw_log,
            ..Self::default()
        }
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            base_delay: self.base_delay,
            jitter: self.jitter,
        }
    }
}

pub struct Runtime {
    registry: Arc<StrategyRegistry>,
    toolchain: Option<Toolchain>,
    options: RuntimeOptions,
    bus: EventBus,
    next_id: AtomicU64,
}

impl Runtime {
    /// Resolve executables and build the default registry. Fails with
    /// `Dependency` before any event is emitted when the downloader is missing.
    pub async fn bootstrap(
        resolver: DependencyResolver,
        options: RuntimeOptions,
        bus: EventBus,
    ) -> Result<Self, MdlError> {
        let toolchain = tokio::task::spawn_blocking(move || resolver.resolve())
            .await
            .map_err(|e| MdlError::dependency(format!("dependency resolution panicked: {e}")))??;
        let registry = StrategyRegistry::with_defaults(Arc::new(toolchain.clone()));
        info!(strategies = ?registry.names(), "runtime ready");
        let mut runtime = Self::with_registry(registry, options, bus);
        runtime.toolchain = Some(toolchain);
        Ok(runtime)
    }

    /// Runtime over a caller-built registry; no dependency resolution.
    pub fn with_registry(registry: StrategyRegistry, options: RuntimeOptions, bus: EventBus) -> Self {
        Self {
            registry: Arc::new(registry),
            toolchain: None,
            options,
            bus,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn toolchain(&self) -> Option<&Toolchain> {
        self.toolchain.as_ref()
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.bus.subscribe()
    }

    /// Validate every request, then run them all to completion.
    ///
    /// Any invalid request aborts the whole batch with `InvalidInput` before a
    /// job is created or an event emitted.
    pub async fn start(&self, requests: Vec<Request>) -> Result<RunSummary, MdlError> {
        let mut jobs: Vec<Job> = requests
            .into_iter()
            .map(|req| Job::new(JobId(0), req))
            .collect();
        for job in &jobs {
            self.registry.resolve(job).prepare(job)?;
        }
        // One reservation per accepted batch keeps concurrent starts disjoint.
        let first = self.next_id.fetch_add(jobs.len() as u64, Ordering::SeqCst);
        for (offset, job) in (0..).zip(jobs.iter_mut()) {
            job.id = JobId(first + offset);
        }

        info!(jobs = jobs.len(), workers = self.options.workers, "starting run");
        let runner = Arc::new(StrategyRunner {
            registry: Arc::clone(&self.registry),
            raw_log: self.options.raw_log,
        });
        let pool = WorkerPool::new(self.options.pool_config(), self.bus.clone());
        let summary = pool.run(jobs, runner).await;
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "run finished"
        );
        Ok(summary)
    }
}

/// Resolves a strategy per attempt and runs it with sinks bound to the attempt.
struct StrategyRunner {
    registry: Arc<StrategyRegistry>,
    raw_log: bool,
}

#[async_trait]
impl JobRunner for StrategyRunner {
    async fn run_attempt(&self, job: &Job, ctx: &AttemptContext) -> Result<DownloadOutcome, MdlError> {
        let strategy = self.registry.resolve(job);
        let prepared = strategy.prepare(job)?;
        debug!(
            job_id = %job.id,
            attempt = ctx.attempt(),
            strategy = strategy.name(),
            program = %prepared.program.display(),
            "running attempt"
        );
        let log: Option<&dyn LogSink> = if self.raw_log { Some(ctx) } else { None };
        strategy.download(&prepared, ctx, log).await
    }
}

//! JobRunner that replays a fixed sequence of attempt outcomes per job.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use mdl_core::model::{DownloadOutcome, Job, JobId};
use mdl_core::pool::{AttemptContext, JobRunner};
use mdl_core::{MdlError, ProgressSnapshot, ProgressStatus};

#[derive(Debug, Clone)]
pub enum Step {
    Ok(&'static str),
    Fail(&'static str),
    Transient(&'static str),
    Panic,
}

/// Outcomes are consumed in order; once exhausted, attempts succeed.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<JobId, Vec<Step>>>,
    pub order: Mutex<Vec<JobId>>,
}

impl ScriptedRunner {
    pub fn with(self, job: u64, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(JobId(job), steps);
        self
    }

    pub fn started_order(&self) -> Vec<JobId> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobRunner for ScriptedRunner {
    async fn run_attempt(&self, job: &Job, ctx: &AttemptContext) -> Result<DownloadOutcome, MdlError> {
        self.order.lock().unwrap().push(job.id);
        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&job.id) {
                Some(steps) if !steps.is_empty() => steps.remove(0),
                _ => Step::Ok("done.mp4"),
            }
        };
        ctx.progress(ProgressSnapshot::new(ProgressStatus::Running).with_message("working"));
        match step {
            Step::Ok(file) => Ok(DownloadOutcome {
                file_path: Some(PathBuf::from(file)),
            }),
            Step::Fail(msg) => Err(MdlError::download(msg)),
            Step::Transient(msg) => Err(MdlError::transient(msg)),
            Step::Panic => panic!("scripted panic"),
        }
    }
}

//! Strategies that drive the yt-dlp style downloader.

use std::path::{Component, Path};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::deps::Toolchain;
use crate::error::MdlError;
use crate::model::{DownloadOutcome, Job, Provider};
use crate::progress::progress_template;

use super::quality::{format_selection, parse_quality, Quality};
use super::{process, DownloadStrategy, LogSink, PreparedInvocation, ProgressSink};

pub const DEFAULT_FILENAME_TEMPLATE: &str = "%(title)s [%(id)s].%(ext)s";

/// Strategy bound to a fixed set of providers with site-specific flags.
pub struct ProviderStrategy {
    name: String,
    providers: Vec<Provider>,
    extra_args: Vec<String>,
    audio_first: bool,
    toolchain: Arc<Toolchain>,
}

impl ProviderStrategy {
    pub fn new(name: impl Into<String>, providers: Vec<Provider>, toolchain: Arc<Toolchain>) -> Self {
        Self {
            name: name.into(),
            providers,
            extra_args: Vec::new(),
            audio_first: false,
            toolchain,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Treat `best` as best audio (music sites).
    pub fn audio_first(mut self) -> Self {
        self.audio_first = true;
        self
    }
}

#[async_trait]
impl DownloadStrategy for ProviderStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, job: &Job) -> bool {
        self.providers.contains(&job.provider)
    }

    fn prepare(&self, job: &Job) -> Result<PreparedInvocation, MdlError> {
        let mut quality = parse_quality(&job.request.quality);
        if self.audio_first && quality == Quality::Best {
            quality = Quality::Audio;
        }
        build_invocation(job, &self.toolchain, quality, &self.extra_args)
    }

    async fn download(
        &self,
        prepared: &PreparedInvocation,
        progress: &dyn ProgressSink,
        log: Option<&dyn LogSink>,
    ) -> Result<DownloadOutcome, MdlError> {
        process::execute(prepared, progress, log).await
    }
}

/// Accepts everything; the registry's fallback.
pub struct GenericStrategy {
    toolchain: Arc<Toolchain>,
}

impl GenericStrategy {
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self { toolchain }
    }
}

#[async_trait]
impl DownloadStrategy for GenericStrategy {
    fn name(&self) -> &str {
        "generic"
    }

    fn can_handle(&self, _job: &Job) -> bool {
        true
    }

    fn prepare(&self, job: &Job) -> Result<PreparedInvocation, MdlError> {
        build_invocation(job, &self.toolchain, parse_quality(&job.request.quality), &[])
    }

    async fn download(
        &self,
        prepared: &PreparedInvocation,
        progress: &dyn ProgressSink,
        log: Option<&dyn LogSink>,
    ) -> Result<DownloadOutcome, MdlError> {
        process::execute(prepared, progress, log).await
    }
}

fn validate_url(raw: &str) -> Result<url::Url, MdlError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| MdlError::invalid_input(format!("invalid URL {raw:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(MdlError::invalid_input(format!(
            "unsupported URL scheme {other:?} in {raw:?}"
        ))),
    }
}

fn validate_template(template: &str) -> Result<(), MdlError> {
    if template.trim().is_empty() {
        return Err(MdlError::invalid_input("filename template is empty"));
    }
    let path = Path::new(template);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(MdlError::invalid_input(format!(
            "filename template {template:?} must stay inside the output directory"
        )));
    }
    Ok(())
}

/// Shared argv construction. The URL always goes last, after `--`.
pub(crate) fn build_invocation(
    job: &Job,
    toolchain: &Toolchain,
    quality: Quality,
    extra_args: &[String],
) -> Result<PreparedInvocation, MdlError> {
    let url = validate_url(&job.request.url)?;
    let template = job
        .request
        .filename_template
        .as_deref()
        .unwrap_or(DEFAULT_FILENAME_TEMPLATE);
    validate_template(template)?;

    let selection = format_selection(quality, toolchain.merger.is_some());
    let output = job.request.output_dir.join(template);

    let mut args: Vec<String> = vec![
        "--newline".into(),
        "--no-colors".into(),
        "--progress-template".into(),
        progress_template(),
        "-f".into(),
        selection.selector,
        "-o".into(),
        output.to_string_lossy().into_owned(),
    ];
    args.extend(selection.extra_args);
    if let Some(merger) = &toolchain.merger {
        args.push("--ffmpeg-location".into());
        args.push(merger.to_string_lossy().into_owned());
    }
    args.extend(extra_args.iter().cloned());
    args.push("--".into());
    args.push(url.to_string());

    debug!(job_id = %job.id, provider = %job.provider, ?quality, "prepared invocation");
    Ok(PreparedInvocation {
        job_id: job.id,
        provider: job.provider,
        program: toolchain.downloader.clone(),
        args,
        timeout: job.request.timeout,
    })
}

//! Get command: download URLs and print the event stream.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mdl_core::config::MdlConfig;
use mdl_core::deps::DependencyResolver;
use mdl_core::events::EventReceiver;
use mdl_core::runtime::{Runtime, RuntimeOptions};
use mdl_core::{EventBus, JobEvent, ProgressSnapshot, Request};

use super::resolver_env;
use crate::cli::GetArgs;

pub async fn run_get(args: GetArgs, cfg: &MdlConfig) -> Result<i32> {
    let requests = build_requests(&args, cfg)?;
    let mut options = RuntimeOptions::from_config(cfg);
    if let Some(jobs) = args.jobs {
        options.workers = jobs as usize;
    }
    options.raw_log |= args.raw_log;

    let bus = EventBus::new();
    let printer = tokio::spawn(print_events(bus.subscribe(), args.json, args.verbose));

    let resolver = DependencyResolver::new(resolver_env(cfg, args.verbose)?);
    let runtime = Runtime::bootstrap(resolver, options, bus).await?;
    let summary = runtime.start(requests).await?;
    // Dropping the runtime closes the bus and ends the printer.
    drop(runtime);
    printer.await.context("event printer")?;

    if !args.json {
        println!(
            "{} succeeded, {} failed",
            summary.succeeded(),
            summary.failed()
        );
    }
    Ok(if summary.all_succeeded() { 0 } else { 1 })
}

pub(crate) fn build_requests(args: &GetArgs, cfg: &MdlConfig) -> Result<Vec<Request>> {
    let output_dir = match args.output_dir.clone().or_else(|| cfg.output_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("current directory")?,
    };
    let quality = args.quality.clone().unwrap_or_else(|| cfg.quality.clone());
    let template = args.template.clone().or_else(|| cfg.filename_template.clone());
    let retries = args.retries.unwrap_or(cfg.retries);
    let timeout = args.timeout.or(cfg.timeout_secs).map(Duration::from_secs);

    Ok(args
        .urls
        .iter()
        .map(|url| Request {
            url: url.clone(),
            quality: quality.clone(),
            output_dir: output_dir.clone(),
            filename_template: template.clone(),
            retries,
            timeout,
        })
        .collect())
}

async fn print_events(mut rx: EventReceiver, json: bool, verbose: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to encode event"),
            }
        } else if let Some(line) = human_line(&event, verbose) {
            println!("{line}");
        }
    }
}

pub(crate) fn human_line(event: &JobEvent, verbose: bool) -> Option<String> {
    let line = match event {
        JobEvent::Started {
            job_id,
            provider,
            attempt,
        } => format!("[{job_id}] started ({provider}, attempt {attempt})"),
        JobEvent::Progress { job_id, snapshot } => {
            if !verbose {
                return None;
            }
            format!("[{job_id}] {}", progress_text(snapshot))
        }
        JobEvent::Retry {
            job_id,
            attempt,
            reason,
            next_delay_ms,
        } => format!("[{job_id}] attempt {attempt} failed: {reason}; retrying in {next_delay_ms} ms"),
        JobEvent::Completed { job_id, result } => {
            let file = result
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(output path unknown)".to_string());
            format!("[{job_id}] done in {:.1}s: {file}", result.elapsed.as_secs_f64())
        }
        JobEvent::Failed { job_id, result } => format!(
            "[{job_id}] failed after {} attempt(s): {}",
            result.attempts,
            result.error.as_deref().unwrap_or("unknown error")
        ),
        JobEvent::Log {
            job_id,
            stream,
            message,
        } => format!("[{job_id}] {stream:?}: {message}"),
    };
    Some(line)
}

fn progress_text(s: &ProgressSnapshot) -> String {
    let mut parts = vec![match s.percent {
        Some(p) => format!("{p:5.1}%"),
        None => "  ?  %".to_string(),
    }];
    if let Some(total) = s.total_bytes {
        parts.push(format!("of {}", human_bytes(total as f64)));
    }
    if let Some(speed) = s.speed_bps {
        parts.push(format!("at {}/s", human_bytes(speed)));
    }
    if let Some(eta) = s.eta_secs {
        parts.push(format!("ETA {}:{:02}", eta / 60, eta % 60));
    }
    parts.join(" ")
}

fn human_bytes(n: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = n;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

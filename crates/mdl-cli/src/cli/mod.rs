//! CLI for the mdl media downloader.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mdl_core::config;

use commands::{run_deps, run_get};

/// Top-level CLI for mdl.
#[derive(Debug, Parser)]
#[command(name = "mdl")]
#[command(about = "mdl: parallel media downloads with retry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs.
    Get(GetArgs),

    /// Locate or bootstrap the downloader and merger, then print their paths.
    Deps {
        /// Report why optional tools are unavailable.
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Page or media URLs.
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Quality: best, worst, audio, 4k, 1080p, 720p, 480p, ...
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Download directory (default: config, then current directory).
    #[arg(short, long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output filename template, relative to the download directory.
    #[arg(short = 't', long = "template")]
    pub template: Option<String>,

    /// Retries after the first attempt of each job.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Run up to N jobs concurrently.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// Per-attempt timeout in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print events as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Forward raw downloader output.
    #[arg(long)]
    pub raw_log: bool,

    /// Print progress lines and optional-tool diagnostics.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliCommand {
    /// Parse arguments, run the command, and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get(args) => run_get(args, &cfg).await,
            CliCommand::Deps { verbose } => run_deps(verbose, &cfg).await,
        }
    }
}

#[cfg(test)]
mod tests;

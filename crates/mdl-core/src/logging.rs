//! Structured logging for the `mdl` binary.
//!
//! The primary sink is an append-only file under the XDG state directory
//! (`~/.local/state/mdl/mdl.log` by default), written without ANSI colours.
//! The filter comes from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].
//! When the file cannot be opened, [`init_logging_stderr`] installs the same
//! subscriber on stderr instead.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,mdl=debug";

/// Writer handed out per event: a clone of the log file handle, or stderr
/// when the handle cannot be cloned (for example after fd exhaustion).
enum LogWriter {
    File(fs::File),
    Stderr,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Hands out clones of one open log file so every event appends to it.
struct SharedFile(fs::File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogWriter::File)
            .unwrap_or(LogWriter::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Location of the log file: `$XDG_STATE_HOME/mdl/mdl.log`.
///
/// Fails only when the XDG base directories cannot be determined (no `HOME`).
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
    Ok(xdg_dirs.get_state_home().join("mdl.log"))
}

/// Initialize structured logging to [`log_path`], creating the state
/// directory if needed.
///
/// Errors (unresolvable state dir, unwritable file, a subscriber already
/// installed) leave no subscriber of ours in place, so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(SharedFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    tracing::info!("mdl logging initialized at {}", path.display());
    Ok(())
}

/// Install the subscriber on stderr, with the same filter and format as
/// [`init_logging`].
///
/// Use this when [`init_logging`] fails, e.g. on a read-only home or in a
/// sandbox without `XDG_STATE_HOME`, so the CLI keeps running with
/// diagnostics on the terminal. Does nothing if a global subscriber is
/// already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

//! Runs a prepared invocation as a subprocess and streams its output.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::MdlError;
use crate::events::LogStream;
use crate::model::DownloadOutcome;
use crate::progress::{parse_destination, parse_line, OutputKind};

use super::guard::ChildGuard;
use super::{LogSink, PreparedInvocation, ProgressSink};

/// Non-empty stderr lines kept for failure messages.
pub const STDERR_TAIL_LINES: usize = 5;

#[derive(Default)]
struct StreamState {
    destination: Option<PathBuf>,
    final_path: Option<PathBuf>,
    stderr_tail: VecDeque<String>,
}

impl StreamState {
    fn push_stderr(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line.to_string());
    }

    fn output_path(&self) -> Option<PathBuf> {
        self.final_path.clone().or_else(|| self.destination.clone())
    }

    fn tail(&self) -> String {
        self.stderr_tail.iter().cloned().collect::<Vec<_>>().join(" | ")
    }
}

/// Spawn `prepared`, forward progress and log lines, and wait for exit.
///
/// Spawn failures and timeouts are transient. A non-zero exit becomes a
/// download error carrying the stderr tail, so its retryability follows the
/// message. On every error path the child is terminated before returning.
pub async fn execute(
    prepared: &PreparedInvocation,
    progress: &dyn ProgressSink,
    log: Option<&dyn LogSink>,
) -> Result<DownloadOutcome, MdlError> {
    let program = prepared.program.display().to_string();
    let child = Command::new(&prepared.program)
        .args(&prepared.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MdlError::transient(format!("failed to spawn {program}: {e}")))?;
    debug!(job_id = %prepared.job_id, pid = ?child.id(), "downloader started");

    let mut guard = ChildGuard::new(child);
    let stdout = guard
        .child_mut()
        .stdout
        .take()
        .ok_or_else(|| MdlError::download("downloader stdout not captured"))?;
    let stderr = guard
        .child_mut()
        .stderr
        .take()
        .ok_or_else(|| MdlError::download("downloader stderr not captured"))?;

    let mut state = StreamState::default();
    let run = async {
        pump(stdout, stderr, progress, log, &mut state).await?;
        guard.wait().await
    };
    let outcome = match prepared.timeout {
        Some(limit) => tokio::time::timeout(limit, run).await.unwrap_or_else(|_| {
            Err(MdlError::transient(format!(
                "downloader timed out after {}s",
                limit.as_secs_f64()
            )))
        }),
        None => run.await,
    };

    let status = match outcome {
        Ok(status) => status,
        Err(e) => {
            guard.terminate().await;
            return Err(e);
        }
    };
    if status.success() {
        let file_path = state.output_path();
        info!(job_id = %prepared.job_id, file = ?file_path, "downloader finished");
        return Ok(DownloadOutcome { file_path });
    }
    Err(exit_error(&status, &state))
}

fn exit_error(status: &ExitStatus, state: &StreamState) -> MdlError {
    let code = match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    };
    let tail = state.tail();
    if tail.is_empty() {
        MdlError::download(format!("downloader {code}"))
    } else {
        MdlError::download(format!("downloader {code}: {tail}"))
    }
}

async fn pump<O, E>(
    stdout: O,
    stderr: E,
    progress: &dyn ProgressSink,
    log: Option<&dyn LogSink>,
    state: &mut StreamState,
) -> Result<(), MdlError>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let (mut out_done, mut err_done) = (false, false);

    while !(out_done && err_done) {
        // read_until keeps partial bytes in the buffer when the other branch wins.
        tokio::select! {
            n = out.read_until(b'\n', &mut out_buf), if !out_done => {
                if read_count(n)? == 0 {
                    out_done = true;
                    if out_buf.is_empty() {
                        continue;
                    }
                }
                let line = take_line(&mut out_buf);
                handle_line(LogStream::Stdout, &line, progress, log, state)?;
            }
            n = err.read_until(b'\n', &mut err_buf), if !err_done => {
                if read_count(n)? == 0 {
                    err_done = true;
                    if err_buf.is_empty() {
                        continue;
                    }
                }
                let line = take_line(&mut err_buf);
                handle_line(LogStream::Stderr, &line, progress, log, state)?;
            }
        }
    }
    Ok(())
}

fn read_count(n: std::io::Result<usize>) -> Result<usize, MdlError> {
    n.map_err(|e| MdlError::download(format!("reading downloader output failed: {e}")))
}

fn take_line(buf: &mut Vec<u8>) -> String {
    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\r', '\n'])
        .to_string();
    buf.clear();
    line
}

fn handle_line(
    stream: LogStream,
    line: &str,
    progress: &dyn ProgressSink,
    log: Option<&dyn LogSink>,
    state: &mut StreamState,
) -> Result<(), MdlError> {
    if let Some(sink) = log {
        sink.log(stream, line)
            .map_err(|e| MdlError::download(format!("log sink failed: {e}")))?;
    }
    if stream == LogStream::Stderr {
        state.push_stderr(line);
    }
    if let Some(marker) = parse_destination(line) {
        match marker.kind {
            OutputKind::Destination => state.destination = Some(marker.path),
            OutputKind::Final => state.final_path = Some(marker.path),
        }
    }
    if let Some(snapshot) = parse_line(line) {
        progress
            .progress(snapshot)
            .map_err(|e| MdlError::download(format!("progress sink failed: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_keeps_last_non_empty_lines() {
        let mut state = StreamState::default();
        for i in 0..8 {
            state.push_stderr(&format!("line {i}"));
            state.push_stderr("   ");
        }
        assert_eq!(state.stderr_tail.len(), STDERR_TAIL_LINES);
        assert_eq!(state.tail(), "line 3 | line 4 | line 5 | line 6 | line 7");
    }

    #[test]
    fn final_path_wins_over_destination() {
        let mut state = StreamState {
            destination: Some("/a/part.f137.mp4".into()),
            ..Default::default()
        };
        assert_eq!(state.output_path(), Some(PathBuf::from("/a/part.f137.mp4")));
        state.final_path = Some("/a/merged.mkv".into());
        assert_eq!(state.output_path(), Some(PathBuf::from("/a/merged.mkv")));
    }

    #[test]
    fn take_line_strips_crlf_and_invalid_utf8() {
        let mut buf = b"[download] caf\xe9\r\n".to_vec();
        assert_eq!(take_line(&mut buf), "[download] caf\u{fffd}");
        assert!(buf.is_empty());
    }
}

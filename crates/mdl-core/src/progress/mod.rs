//! Progress telemetry parsed from downloader output.
//!
//! [`parse_line`] turns one line of subprocess output into an optional
//! [`ProgressSnapshot`]. Two grammars are tried in order: the structured
//! template the strategies request (`[mdl-progress]` marker, `|`-separated
//! fields) and the downloader's human-readable `[download]` lines. Parsing is
//! total: any input yields either a snapshot or `None`, never a panic.

mod destination;
mod human;
mod structured;
mod units;

use serde::{Deserialize, Serialize};

pub use destination::{parse_destination, OutputKind, OutputMarker};
pub use structured::{progress_template, PROGRESS_MARKER};
pub use units::{parse_eta, parse_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Queued,
    Preparing,
    Running,
    Retrying,
    Completed,
    Failed,
}

/// Point-in-time read of a transfer.
///
/// `percent` is always within `[0, 100]` and `downloaded_bytes <= total_bytes`
/// whenever both are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    pub percent: Option<f64>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    /// Bytes per second.
    pub speed_bps: Option<f64>,
    pub eta_secs: Option<u64>,
    pub message: Option<String>,
}

impl ProgressSnapshot {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            percent: None,
            downloaded_bytes: None,
            total_bytes: None,
            speed_bps: None,
            eta_secs: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Fill derivable fields and enforce the range invariants.
    fn normalized(mut self) -> Self {
        if let (None, Some(done), Some(total)) = (self.percent, self.downloaded_bytes, self.total_bytes)
        {
            if total > 0 {
                self.percent = Some(done as f64 / total as f64 * 100.0);
            }
        }
        if self.status == ProgressStatus::Completed && self.percent.is_none() {
            self.percent = Some(100.0);
        }
        self.percent = self
            .percent
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0));
        if let (None, Some(pct), Some(total)) = (self.downloaded_bytes, self.percent, self.total_bytes) {
            self.downloaded_bytes = Some((total as f64 * pct / 100.0).round() as u64);
        }
        if let (Some(done), Some(total)) = (self.downloaded_bytes, self.total_bytes) {
            self.downloaded_bytes = Some(done.min(total));
        }
        self.speed_bps = self.speed_bps.filter(|s| s.is_finite() && *s >= 0.0);
        self
    }
}

/// Parse one line of downloader output. `None` when the line carries no
/// progress information.
pub fn parse_line(line: &str) -> Option<ProgressSnapshot> {
    structured::parse(line)
        .or_else(|| human::parse(line))
        .map(ProgressSnapshot::normalized)
}

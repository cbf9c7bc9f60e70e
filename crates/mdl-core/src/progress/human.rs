//! Fallback grammar for the downloader's own `[download]` progress lines,
//! e.g. `[download]  42.3% of ~ 120.50MiB at  2.31MiB/s ETA 00:41`.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::units::{parse_eta, parse_size};
use super::{ProgressSnapshot, ProgressStatus};

struct Patterns {
    percent: Regex,
    total: Regex,
    speed: Regex,
    eta: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // Percent must be the first token after the tag; paths may contain `%`.
        percent: Regex::new(r"^\s*\[download\]\s+(\d+(?:\.\d+)?)%").expect("static regex"),
        total: Regex::new(r"(?i)\bof\s+~?\s*(\d+(?:\.\d+)?)\s*([kmgt]i?b|b)\b")
            .expect("static regex"),
        speed: Regex::new(r"(?i)\bat\s+~?\s*(\d+(?:\.\d+)?)\s*([kmgt]i?b|b)/s").expect("static regex"),
        eta: Regex::new(r"ETA\s+(\S+)").expect("static regex"),
    })
}

pub(super) fn parse(line: &str) -> Option<ProgressSnapshot> {
    let p = patterns();
    let percent: f64 = p.percent.captures(line)?.get(1)?.as_str().parse().ok()?;

    let mut snap = ProgressSnapshot::new(ProgressStatus::Running);
    snap.percent = Some(percent);
    snap.total_bytes = p
        .total
        .captures(line)
        .and_then(|c| parse_size(c.get(1)?.as_str(), c.get(2)?.as_str()));
    snap.speed_bps = p
        .speed
        .captures(line)
        .and_then(|c| parse_size(c.get(1)?.as_str(), c.get(2)?.as_str()))
        .map(|b| b as f64);
    snap.eta_secs = p
        .eta
        .captures(line)
        .and_then(|c| parse_eta(c.get(1)?.as_str()));
    Some(snap)
}

//! Structured progress grammar: `[mdl-progress]status|done|total|estimate|speed|eta|percent`.

use super::{ProgressSnapshot, ProgressStatus};

/// Marker prefix emitted through the downloader's progress template.
pub const PROGRESS_MARKER: &str = "[mdl-progress]";

/// Value for the downloader's `--progress-template` flag producing lines in
/// this grammar.
pub fn progress_template() -> String {
    format!(
        "download:{PROGRESS_MARKER}%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s|%(progress._percent_str)s"
    )
}

pub(super) fn parse(line: &str) -> Option<ProgressSnapshot> {
    let start = line.find(PROGRESS_MARKER)?;
    let body = &line[start + PROGRESS_MARKER.len()..];
    let fields: Vec<&str> = body.split('|').collect();
    let field = |i: usize| fields.get(i).copied().unwrap_or("");

    let status_raw = field(0).trim();
    if status_raw.is_empty() {
        return None;
    }

    let mut snap = ProgressSnapshot::new(map_status(status_raw));
    snap.downloaded_bytes = number(field(1)).map(|n| n.round() as u64);
    snap.total_bytes = number(field(2))
        .or_else(|| number(field(3)))
        .map(|n| n.round() as u64);
    snap.speed_bps = number(field(4));
    snap.eta_secs = number(field(5)).map(|n| n.round() as u64);
    snap.percent = number(field(6).trim().trim_end_matches('%'));
    Some(snap)
}

fn map_status(raw: &str) -> ProgressStatus {
    match raw.to_ascii_lowercase().as_str() {
        "finished" => ProgressStatus::Completed,
        "error" => ProgressStatus::Failed,
        _ => ProgressStatus::Running,
    }
}

/// Numeric field; `NA`, `None` and empty mean unknown.
fn number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("none") {
        return None;
    }
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::super::parse_line;
    use super::*;

    #[test]
    fn full_line() {
        let snap =
            parse_line("[mdl-progress]downloading|1048576|4194304|NA|524288.5|6|  25.0%").unwrap();
        assert_eq!(snap.status, ProgressStatus::Running);
        assert_eq!(snap.downloaded_bytes, Some(1_048_576));
        assert_eq!(snap.total_bytes, Some(4_194_304));
        assert_eq!(snap.speed_bps, Some(524_288.5));
        assert_eq!(snap.eta_secs, Some(6));
        assert_eq!(snap.percent, Some(25.0));
    }

    #[test]
    fn unknown_tokens_are_absent_not_zero() {
        let snap = parse_line("[mdl-progress]downloading|NA|None||NA|None|NA|NA").unwrap();
        assert_eq!(snap.downloaded_bytes, None);
        assert_eq!(snap.total_bytes, None);
        assert_eq!(snap.speed_bps, None);
        assert_eq!(snap.eta_secs, None);
        assert_eq!(snap.percent, None);
    }

    #[test]
    fn percent_derived_from_bytes() {
        let snap = parse_line("[mdl-progress]downloading|333|1000|NA|NA|NA|NA").unwrap();
        let pct = snap.percent.unwrap();
        assert!((pct - 33.3).abs() < 1e-9, "{pct}");
    }

    #[test]
    fn derived_percent_round_trips_synthetic_bytes() {
        for (done, total) in [(1u64, 3u64), (512, 2048), (999_999, 1_000_000), (0, 10)] {
            let line = format!("[mdl-progress]downloading|{done}|{total}|NA|NA|NA|NA");
            let pct = parse_line(&line).unwrap().percent.unwrap();
            let expected = done as f64 / total as f64 * 100.0;
            assert!((pct - expected).abs() < 1e-9, "{done}/{total}: {pct}");
        }
    }

    #[test]
    fn zero_total_does_not_derive() {
        let snap = parse_line("[mdl-progress]downloading|10|0|NA|NA|NA|NA").unwrap();
        assert_eq!(snap.percent, None);
    }

    #[test]
    fn estimate_used_when_total_unknown() {
        let snap = parse_line("[mdl-progress]downloading|50|NA|200|NA|NA|NA").unwrap();
        assert_eq!(snap.total_bytes, Some(200));
        assert_eq!(snap.percent, Some(25.0));
    }

    #[test]
    fn finished_defaults_to_full() {
        let snap = parse_line("[mdl-progress]finished|NA|NA|NA|NA|NA|NA").unwrap();
        assert_eq!(snap.status, ProgressStatus::Completed);
        assert_eq!(snap.percent, Some(100.0));
    }

    #[test]
    fn float_byte_counts_accepted() {
        let snap = parse_line("[mdl-progress]downloading|1024.0|2048.0|NA|NA|3.0|NA").unwrap();
        assert_eq!(snap.downloaded_bytes, Some(1024));
        assert_eq!(snap.eta_secs, Some(3));
    }

    #[test]
    fn short_or_empty_status() {
        assert!(parse_line("[mdl-progress]").is_none());
        assert!(parse_line("[mdl-progress]||||||").is_none());
        let snap = parse_line("[mdl-progress]downloading").unwrap();
        assert_eq!(snap.percent, None);
    }

    #[test]
    fn template_contains_marker() {
        let t = progress_template();
        assert!(t.starts_with("download:[mdl-progress]"));
        assert_eq!(t.matches('|').count(), 6);
    }
}

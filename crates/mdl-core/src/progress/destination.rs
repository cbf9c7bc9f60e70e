//! Output-file markers in downloader output.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Where a single stream is being written.
    Destination,
    /// Final file of a merge or audio extraction; supersedes `Destination`.
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMarker {
    pub path: PathBuf,
    pub kind: OutputKind,
}

const DESTINATION: &str = "Destination:";
const MERGING_INTO: &str = "Merging formats into";
const ALREADY_DOWNLOADED: &str = " has already been downloaded";

/// Detect a line naming the output file.
pub fn parse_destination(line: &str) -> Option<OutputMarker> {
    let line = line.trim();

    if let Some(idx) = line.find(MERGING_INTO) {
        let path = unquote(&line[idx + MERGING_INTO.len()..]);
        return marker(path, OutputKind::Final);
    }

    if let Some(idx) = line.find(DESTINATION) {
        let path = unquote(&line[idx + DESTINATION.len()..]);
        let kind = if line.starts_with("[ExtractAudio]") {
            OutputKind::Final
        } else {
            OutputKind::Destination
        };
        return marker(path, kind);
    }

    if let Some(rest) = line.strip_prefix("[download]") {
        if let Some(path) = rest.strip_suffix(ALREADY_DOWNLOADED) {
            return marker(unquote(path), OutputKind::Destination);
        }
    }

    None
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

fn marker(path: &str, kind: OutputKind) -> Option<OutputMarker> {
    if path.is_empty() {
        return None;
    }
    Some(OutputMarker {
        path: PathBuf::from(path),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_destination() {
        let m = parse_destination("[download] Destination: /media/Clip [abc].f137.mp4").unwrap();
        assert_eq!(m.path, PathBuf::from("/media/Clip [abc].f137.mp4"));
        assert_eq!(m.kind, OutputKind::Destination);
    }

    #[test]
    fn merge_target_is_final() {
        let m = parse_destination("[Merger] Merging formats into \"/media/Clip [abc].mkv\"").unwrap();
        assert_eq!(m.path, PathBuf::from("/media/Clip [abc].mkv"));
        assert_eq!(m.kind, OutputKind::Final);
    }

    #[test]
    fn extract_audio_is_final() {
        let m = parse_destination("[ExtractAudio] Destination: /media/song.mp3").unwrap();
        assert_eq!(m.kind, OutputKind::Final);
    }

    #[test]
    fn already_downloaded() {
        let m = parse_destination("[download] /media/old.mp4 has already been downloaded").unwrap();
        assert_eq!(m.path, PathBuf::from("/media/old.mp4"));
    }

    #[test]
    fn unrelated_lines() {
        assert!(parse_destination("[download]  42.0% of 1.00MiB").is_none());
        assert!(parse_destination("[download] Destination:   ").is_none());
        assert!(parse_destination("").is_none());
    }
}

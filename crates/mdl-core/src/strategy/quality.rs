//! Quality tokens to downloader format selectors.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Best,
    Worst,
    Audio,
    /// Cap on video height in pixels.
    MaxHeight(u32),
}

/// Normalize a user-facing token. Unknown tokens degrade to [`Quality::Best`].
pub fn parse_quality(raw: &str) -> Quality {
    let token = raw.trim().to_ascii_lowercase();
    match token.as_str() {
        "" | "best" => Quality::Best,
        "worst" => Quality::Worst,
        "audio" | "bestaudio" | "audio-only" => Quality::Audio,
        "4k" | "uhd" => Quality::MaxHeight(2160),
        "2k" | "qhd" => Quality::MaxHeight(1440),
        "fhd" => Quality::MaxHeight(1080),
        "hd" => Quality::MaxHeight(720),
        "sd" => Quality::MaxHeight(480),
        other => match other.strip_suffix('p').unwrap_or(other).parse::<u32>() {
            Ok(h) if (144..=4320).contains(&h) => Quality::MaxHeight(h),
            _ => {
                warn!(quality = raw, "unknown quality token, using best");
                Quality::Best
            }
        },
    }
}

/// Format selector plus any post-processing flags it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    pub selector: String,
    pub extra_args: Vec<String>,
}

impl FormatSelection {
    fn plain(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            extra_args: Vec::new(),
        }
    }
}

/// Map a quality to a selector. `can_merge` is true when a muxer is available,
/// which allows separate video and audio streams.
pub fn format_selection(quality: Quality, can_merge: bool) -> FormatSelection {
    match (quality, can_merge) {
        (Quality::Best, true) => FormatSelection::plain("bestvideo*+bestaudio/best"),
        (Quality::Best, false) => FormatSelection::plain("best"),
        (Quality::Worst, true) => FormatSelection::plain("worstvideo*+worstaudio/worst"),
        (Quality::Worst, false) => FormatSelection::plain("worst"),
        (Quality::Audio, true) => FormatSelection {
            selector: "bestaudio/best".to_string(),
            extra_args: vec!["-x".into(), "--audio-format".into(), "mp3".into()],
        },
        (Quality::Audio, false) => FormatSelection::plain("bestaudio/best"),
        (Quality::MaxHeight(h), true) => FormatSelection::plain(format!(
            "bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"
        )),
        (Quality::MaxHeight(h), false) => FormatSelection::plain(format!("best[height<={h}]/best")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_tokens() {
        assert_eq!(parse_quality("best"), Quality::Best);
        assert_eq!(parse_quality(" WORST "), Quality::Worst);
        assert_eq!(parse_quality("bestaudio"), Quality::Audio);
        assert_eq!(parse_quality("4k"), Quality::MaxHeight(2160));
        assert_eq!(parse_quality("hd"), Quality::MaxHeight(720));
        assert_eq!(parse_quality("1080p"), Quality::MaxHeight(1080));
        assert_eq!(parse_quality("480"), Quality::MaxHeight(480));
    }

    #[test]
    fn unknown_tokens_degrade_to_best() {
        assert_eq!(parse_quality("ultra"), Quality::Best);
        assert_eq!(parse_quality("99999p"), Quality::Best);
        assert_eq!(parse_quality("12p"), Quality::Best);
    }

    #[test]
    fn height_cap_with_and_without_merger() {
        let merged = format_selection(Quality::MaxHeight(720), true);
        assert_eq!(
            merged.selector,
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );
        let single = format_selection(Quality::MaxHeight(720), false);
        assert_eq!(single.selector, "best[height<=720]/best");
        assert!(single.extra_args.is_empty());
    }

    #[test]
    fn audio_extraction_needs_merger() {
        assert_eq!(
            format_selection(Quality::Audio, true).extra_args,
            vec!["-x", "--audio-format", "mp3"]
        );
        assert!(format_selection(Quality::Audio, false).extra_args.is_empty());
    }
}

//! Release metadata and asset selection.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

const EXCLUDED_SUFFIXES: &[&str] = &[
    ".sha256", ".sha512", ".md5", ".sig", ".asc", ".txt", ".gz", ".zip", ".tar", ".xz", ".bz2",
];
const EXCLUDED_WORDS: &[&str] = &["license", "readme", "checksum"];

fn is_auxiliary(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    EXCLUDED_SUFFIXES.iter().any(|s| lower.ends_with(s))
        || EXCLUDED_WORDS.iter().any(|w| lower.contains(w))
}

/// Exact name match first, then the first non-auxiliary asset whose name
/// starts with `wanted`.
pub fn select_asset<'a>(assets: &'a [ReleaseAsset], wanted: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|a| a.name == wanted).or_else(|| {
        assets
            .iter()
            .find(|a| a.name.starts_with(wanted) && !is_auxiliary(&a.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            browser_download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn exact_match_preferred() {
        let assets = [asset("ffmpeg-linux-x64.gz"), asset("ffmpeg-linux-x64")];
        assert_eq!(select_asset(&assets, "ffmpeg-linux-x64").unwrap().name, "ffmpeg-linux-x64");
    }

    #[test]
    fn relaxed_match_skips_auxiliary_files() {
        let assets = [
            asset("ffmpeg-linux-x64.sha256"),
            asset("ffmpeg-linux-x64.LICENSE"),
            asset("ffmpeg-linux-x64.README"),
            asset("ffmpeg-linux-x64.gz"),
            asset("ffmpeg-linux-x64-static"),
        ];
        assert_eq!(
            select_asset(&assets, "ffmpeg-linux-x64").unwrap().name,
            "ffmpeg-linux-x64-static"
        );
    }

    #[test]
    fn no_match() {
        let assets = [asset("ffmpeg-darwin-x64"), asset("ffmpeg-linux-x64.md5")];
        assert!(select_asset(&assets, "ffmpeg-linux-x64").is_none());
    }

    #[test]
    fn parses_release_json() {
        let json = r#"{"tag_name":"b6.0","assets":[{"name":"ffmpeg-linux-x64","browser_download_url":"https://x/y","size":1}]}"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "b6.0");
        assert_eq!(release.assets.len(), 1);
    }
}

//! Executable names and release asset names per platform.

use super::env::ResolverEnv;

pub const DOWNLOADER: &str = "yt-dlp";
pub const MERGER: &str = "ffmpeg";

const DOWNLOADER_RELEASE_BASE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download/";
pub const MERGER_RELEASE_API: &str =
    "https://api.github.com/repos/eugeneware/ffmpeg-static/releases/latest";

/// File names an executable may have on disk.
pub fn exe_names(base: &str, env: &ResolverEnv) -> Vec<String> {
    if env.is_windows() {
        vec![format!("{base}.exe"), base.to_string()]
    } else {
        vec![base.to_string()]
    }
}

/// Standalone downloader asset for the platform, if one is published.
pub fn downloader_asset(env: &ResolverEnv) -> Option<&'static str> {
    match (env.os.as_str(), env.arch.as_str()) {
        ("linux", "x86_64") => Some("yt-dlp_linux"),
        ("linux", "aarch64") => Some("yt-dlp_linux_aarch64"),
        ("linux", "arm") => Some("yt-dlp_linux_armv7l"),
        ("macos", _) => Some("yt-dlp_macos"),
        ("windows", "x86_64") | ("windows", "aarch64") => Some("yt-dlp.exe"),
        ("windows", "x86") => Some("yt-dlp_x86.exe"),
        _ => None,
    }
}

pub fn downloader_url(env: &ResolverEnv) -> Option<String> {
    if let Some(url) = &env.downloader_url {
        return Some(url.clone());
    }
    downloader_asset(env).map(|asset| format!("{DOWNLOADER_RELEASE_BASE}{asset}"))
}

/// Static merger build name in the release listing.
pub fn merger_asset(env: &ResolverEnv) -> Option<String> {
    let os = match env.os.as_str() {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "win32",
        _ => return None,
    };
    let arch = match env.arch.as_str() {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "arm" => "arm",
        _ => return None,
    };
    Some(format!("ffmpeg-{os}-{arch}"))
}

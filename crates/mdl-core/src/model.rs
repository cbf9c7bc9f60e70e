//! Requests, jobs and results.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the caller asked for. Immutable once a [`Job`] is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Target page or media URL.
    pub url: String,
    /// Quality token (`best`, `720p`, `audio`, ...).
    pub quality: String,
    pub output_dir: PathBuf,
    /// Downloader output template relative to `output_dir`.
    pub filename_template: Option<String>,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            quality: "best".to_string(),
            output_dir: output_dir.into(),
            filename_template: None,
            retries: 3,
            timeout: None,
        }
    }
}

/// Job identity, assigned in submission order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media provider a URL belongs to; `Generic` catches everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    YouTube,
    Vimeo,
    TikTok,
    Twitter,
    Instagram,
    SoundCloud,
    Generic,
}

/// Host suffixes per provider. A host matches when it equals the suffix or
/// ends with `.<suffix>`.
const PROVIDER_HOSTS: &[(Provider, &[&str])] = &[
    (Provider::YouTube, &["youtube.com", "youtu.be", "youtube-nocookie.com"]),
    (Provider::Vimeo, &["vimeo.com"]),
    (Provider::TikTok, &["tiktok.com"]),
    (Provider::Twitter, &["twitter.com", "x.com"]),
    (Provider::Instagram, &["instagram.com"]),
    (Provider::SoundCloud, &["soundcloud.com"]),
];

impl Provider {
    /// Classify a URL by host. Unparseable URLs are `Generic`.
    pub fn classify(raw_url: &str) -> Provider {
        let Ok(parsed) = url::Url::parse(raw_url.trim()) else {
            return Provider::Generic;
        };
        let Some(host) = parsed.host_str() else {
            return Provider::Generic;
        };
        let host = host.to_ascii_lowercase();
        for (provider, suffixes) in PROVIDER_HOSTS {
            let hit = suffixes.iter().any(|s| {
                host == *s
                    || host
                        .strip_suffix(s)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            });
            if hit {
                return *provider;
            }
        }
        Provider::Generic
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::TikTok => "tiktok",
            Provider::Twitter => "twitter",
            Provider::Instagram => "instagram",
            Provider::SoundCloud => "soundcloud",
            Provider::Generic => "generic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of orchestrated work. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub request: Request,
    pub provider: Provider,
}

impl Job {
    pub fn new(id: JobId, request: Request) -> Self {
        let provider = Provider::classify(&request.url);
        Self {
            id,
            request,
            provider,
        }
    }
}

/// Terminal outcome of a job; produced exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub success: bool,
    pub provider: Provider,
    pub file_path: Option<PathBuf>,
    /// Wall time from the first attempt's start to the terminal state.
    #[serde(with = "duration_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    pub attempts: u32,
    pub error: Option<String>,
}

/// What a successful attempt produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub file_path: Option<PathBuf>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

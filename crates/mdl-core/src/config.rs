//! User configuration at `$XDG_CONFIG_HOME/mdl/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Defaults for `mdl get`; every field can be overridden on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdlConfig {
    /// Concurrent jobs.
    pub workers: usize,
    /// Retries after the first attempt of each job.
    pub retries: u32,
    /// Base backoff delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,
    /// Per-attempt timeout in seconds (None = no limit).
    pub timeout_secs: Option<u64>,
    pub quality: String,
    /// Download directory (None = current directory).
    pub output_dir: Option<PathBuf>,
    pub filename_template: Option<String>,
    /// Where bootstrapped executables go (None = XDG cache).
    pub cache_dir: Option<PathBuf>,
    /// Pinned SHA-256 for a bootstrapped downloader.
    pub downloader_sha256: Option<String>,
    /// Forward raw downloader output as log events.
    pub raw_log: bool,
}

impl Default for MdlConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            retries: 3,
            base_delay_ms: 500,
            timeout_secs: None,
            quality: "best".to_string(),
            output_dir: None,
            filename_template: None,
            cache_dir: None,
            downloader_sha256: None,
            raw_log: false,
        }
    }
}

impl MdlConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.base_delay_ms == 0 {
            bail!("base_delay_ms must be positive");
        }
        if self.timeout_secs == Some(0) {
            bail!("timeout_secs must be positive when set");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdlConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<MdlConfig> {
    if !path.exists() {
        let cfg = MdlConfig::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&cfg)?)
            .with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

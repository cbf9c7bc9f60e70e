//! Resolver inputs. The only place the resolver touches process state.

use std::path::PathBuf;

use anyhow::Result;

/// Everything the resolver needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct ResolverEnv {
    /// Directories searched for existing executables, in order.
    pub path_dirs: Vec<PathBuf>,
    /// Where bootstrapped executables are stored.
    pub cache_dir: PathBuf,
    /// `std::env::consts::OS` style name.
    pub os: String,
    /// `std::env::consts::ARCH` style name.
    pub arch: String,
    /// Report optional-dependency degradation as warnings.
    pub verbose: bool,
    /// Direct download URL overriding the platform default for the downloader.
    pub downloader_url: Option<String>,
    /// Release metadata endpoint overriding the default for the merger.
    pub merger_release_api: Option<String>,
    /// Expected lowercase hex SHA-256 of a bootstrapped downloader.
    pub downloader_sha256: Option<String>,
}

impl ResolverEnv {
    /// Empty search path, host platform.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            path_dirs: Vec::new(),
            cache_dir: cache_dir.into(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            verbose: false,
            downloader_url: None,
            merger_release_api: None,
            downloader_sha256: None,
        }
    }

    /// `PATH` plus the XDG cache dir (`$XDG_CACHE_HOME/mdl/bin`).
    pub fn from_process_env() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
        let cache_dir = xdg_dirs.get_cache_home().join("mdl").join("bin");
        let mut env = Self::new(cache_dir);
        if let Some(path) = std::env::var_os("PATH") {
            env.path_dirs = std::env::split_paths(&path).collect();
        }
        Ok(env)
    }

    pub fn with_path_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.path_dirs = dirs;
        self
    }

    pub fn with_platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

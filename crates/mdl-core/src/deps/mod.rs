//! Locates or bootstraps the external executables a run needs.
//!
//! The downloader is mandatory: if it is neither on the search path, nor in
//! the cache, nor downloadable for this platform, resolution fails with
//! [`MdlError::Dependency`]. The merger is optional: any failure to obtain it
//! leaves [`Toolchain::merger`] unset and strategies fall back to single-file
//! formats.
//!
//! Resolution blocks (filesystem and HTTP); async callers wrap it in
//! `spawn_blocking`.

mod assets;
mod env;
mod fetch;
mod platform;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::checksum::{digest_matches, sha256_path};
use crate::error::MdlError;

pub use assets::{select_asset, Release, ReleaseAsset};
pub use env::ResolverEnv;
pub use fetch::{CurlFetcher, Fetcher};
pub use platform::{
    downloader_asset, downloader_url, exe_names, merger_asset, DOWNLOADER, MERGER,
    MERGER_RELEASE_API,
};

/// Resolved executable paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub downloader: PathBuf,
    pub merger: Option<PathBuf>,
}

impl Toolchain {
    pub fn new(downloader: impl Into<PathBuf>, merger: Option<PathBuf>) -> Self {
        Self {
            downloader: downloader.into(),
            merger,
        }
    }
}

pub struct DependencyResolver {
    env: ResolverEnv,
    fetcher: Arc<dyn Fetcher>,
}

impl DependencyResolver {
    pub fn new(env: ResolverEnv) -> Self {
        Self::with_fetcher(env, Arc::new(CurlFetcher::default()))
    }

    pub fn with_fetcher(env: ResolverEnv, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { env, fetcher }
    }

    pub fn env(&self) -> &ResolverEnv {
        &self.env
    }

    pub fn resolve(&self) -> Result<Toolchain, MdlError> {
        let downloader = self.resolve_downloader()?;
        let merger = self.resolve_merger();
        info!(
            downloader = %downloader.display(),
            merger = ?merger,
            "dependencies resolved"
        );
        Ok(Toolchain { downloader, merger })
    }

    /// Search path first, then the cache dir.
    fn find_local(&self, base: &str) -> Option<PathBuf> {
        let names = exe_names(base, &self.env);
        self.env
            .path_dirs
            .iter()
            .chain(std::iter::once(&self.env.cache_dir))
            .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
            .find(|p| is_executable(p))
    }

    fn cache_target(&self, base: &str) -> PathBuf {
        let names = exe_names(base, &self.env);
        self.env.cache_dir.join(&names[0])
    }

    fn resolve_downloader(&self) -> Result<PathBuf, MdlError> {
        if let Some(found) = self.find_local(DOWNLOADER) {
            debug!(path = %found.display(), "using local {}", DOWNLOADER);
            return Ok(found);
        }
        let url = downloader_url(&self.env).ok_or_else(|| {
            MdlError::dependency(format!(
                "{DOWNLOADER} not found and no build is published for {}/{}",
                self.env.os, self.env.arch
            ))
        })?;
        let dest = self.cache_target(DOWNLOADER);
        let digest = self.install(&url, &dest).map_err(|e| {
            MdlError::dependency(format!("bootstrapping {DOWNLOADER} from {url} failed: {e:#}"))
        })?;
        if let Some(expected) = &self.env.downloader_sha256 {
            if !digest_matches(&digest, expected) {
                let _ = fs::remove_file(&dest);
                return Err(MdlError::dependency(format!(
                    "{DOWNLOADER} checksum mismatch: expected {expected}, got {digest}"
                )));
            }
        }
        Ok(dest)
    }

    fn resolve_merger(&self) -> Option<PathBuf> {
        if let Some(found) = self.find_local(MERGER) {
            debug!(path = %found.display(), "using local {}", MERGER);
            return Some(found);
        }
        match self.bootstrap_merger() {
            Ok(path) => Some(path),
            Err(e) => {
                if self.env.verbose {
                    warn!("{MERGER} unavailable, merging disabled: {e:#}");
                } else {
                    debug!("{MERGER} unavailable, merging disabled: {e:#}");
                }
                None
            }
        }
    }

    fn bootstrap_merger(&self) -> Result<PathBuf> {
        let wanted = merger_asset(&self.env).with_context(|| {
            format!("no static {MERGER} build for {}/{}", self.env.os, self.env.arch)
        })?;
        let api = self
            .env
            .merger_release_api
            .as_deref()
            .unwrap_or(MERGER_RELEASE_API);
        let body = self.fetcher.fetch_bytes(api)?;
        let release: Release =
            serde_json::from_slice(&body).context("parsing release metadata")?;
        let asset = select_asset(&release.assets, &wanted).with_context(|| {
            format!("release {:?} has no asset matching {wanted}", release.tag_name)
        })?;
        let dest = self.cache_target(MERGER);
        self.install(&asset.browser_download_url, &dest)?;
        Ok(dest)
    }

    /// Download `url` to `dest` through a temp file in the cache dir, mark it
    /// executable, and return its SHA-256.
    fn install(&self, url: &str, dest: &Path) -> Result<String> {
        let dir = &self.env.cache_dir;
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        info!(url, dest = %dest.display(), "downloading executable");
        let written = self.fetcher.fetch_to(url, tmp.as_file_mut())?;
        if written == 0 {
            bail!("{url} returned an empty body");
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest)
            .map_err(|e| e.error)
            .with_context(|| format!("persist {}", dest.display()))?;
        make_executable(dest)?;
        if !dest.is_file() {
            bail!("{} is not a regular file after install", dest.display());
        }
        let digest = sha256_path(dest)?;
        info!(path = %dest.display(), bytes = written, sha256 = %digest, "installed executable");
        Ok(digest)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_context(|| format!("chmod {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

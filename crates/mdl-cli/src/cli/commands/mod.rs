//! CLI command handlers.

mod deps;
mod get;

use anyhow::Result;
use mdl_core::config::MdlConfig;
use mdl_core::deps::ResolverEnv;

pub use deps::run_deps;
pub use get::run_get;

/// Process environment with config overrides applied.
fn resolver_env(cfg: &MdlConfig, verbose: bool) -> Result<ResolverEnv> {
    let mut env = ResolverEnv::from_process_env()?.verbose(verbose);
    if let Some(dir) = &cfg.cache_dir {
        env.cache_dir = dir.clone();
    }
    env.downloader_sha256 = cfg.downloader_sha256.clone();
    Ok(env)
}

#[cfg(test)]
pub(crate) use get::build_requests;

//! Deps command: resolve executables and print where they are.

use anyhow::Result;
use mdl_core::config::MdlConfig;
use mdl_core::deps::{DependencyResolver, DOWNLOADER, MERGER};

use super::resolver_env;

pub async fn run_deps(verbose: bool, cfg: &MdlConfig) -> Result<i32> {
    let resolver = DependencyResolver::new(resolver_env(cfg, verbose)?);
    let toolchain = tokio::task::spawn_blocking(move || resolver.resolve()).await??;
    println!("{:<8}{}", DOWNLOADER, toolchain.downloader.display());
    match &toolchain.merger {
        Some(path) => println!("{:<8}{}", MERGER, path.display()),
        None => println!("{:<8}(unavailable, format merging disabled)", MERGER),
    }
    Ok(0)
}

//! Shell scripts standing in for the real downloader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdl_core::deps::Toolchain;
use mdl_core::events::EventBus;
use mdl_core::retry::Jitter;
use mdl_core::runtime::{Runtime, RuntimeOptions};
use mdl_core::strategy::{GenericStrategy, StrategyRegistry};

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Fast backoff, deterministic jitter.
pub fn quick_options(workers: usize) -> RuntimeOptions {
    RuntimeOptions {
        workers,
        base_delay: std::time::Duration::from_millis(10),
        jitter: Jitter::Fixed(1.0),
        raw_log: false,
    }
}

/// Runtime whose only strategy runs `program` as the downloader.
pub fn runtime_for(program: PathBuf, options: RuntimeOptions, bus: EventBus) -> Runtime {
    let toolchain = Arc::new(Toolchain::new(program, None));
    let registry = StrategyRegistry::new(Arc::new(GenericStrategy::new(toolchain)));
    Runtime::with_registry(registry, options, bus)
}

//! SHA-256 of bootstrapped executables.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the file at `path`, streamed.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a computed digest with a user-supplied pin (case and surrounding
/// whitespace ignored).
pub fn digest_matches(actual: &str, pinned: &str) -> bool {
    actual.eq_ignore_ascii_case(pinned.trim())
}

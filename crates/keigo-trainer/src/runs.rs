//! Run-directory management.
//!
//! Each training run gets a unique directory under the output root,
//! named by a monotonic timestamp plus a random suffix. This replaces
//! the scan-for-next-free-number scheme the pipeline used previously,
//! which raced under concurrent runs and touched the filesystem in a
//! loop.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

/// Unique identifier for one training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

impl RunId {
    /// Generates a fresh id: unix seconds plus a 16-bit random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let mut rng = oorandom::Rand32::new(now.subsec_nanos().into());
        let suffix = rng.rand_u32() & 0xffff;
        Self(format!("run-{}-{suffix:04x}", now.as_secs()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creates a fresh run directory under `root` and returns its path.
///
/// # Errors
///
/// Propagates directory-creation failures.
pub fn create_run_dir<P: AsRef<Path>>(root: P) -> Result<PathBuf> {
    let id = RunId::generate();
    let dir = root.as_ref().join(id.as_str());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create run directory {}", dir.display()))?;
    tracing::info!(run = %id, dir = %dir.display(), "created run directory");
    Ok(dir)
}

//! Harness configuration.
//!
//! Everything the original test scripts kept as module-level defaults (engine
//! binary location, database file name) is an explicit field here, threaded
//! through the session and lifecycle layers.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conventional location of the engine binary in a development checkout.
pub const DEFAULT_ENGINE_BINARY: &str = "./target/debug/rust_sqlite";

/// Conventional database file name used when no path is given.
pub const DEFAULT_DB_PATH: &str = "default.db";

/// Default bound on the read-to-end-of-stream wait.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment override for the engine binary path.
pub const ENV_ENGINE_BINARY: &str = "RSQLITE_BIN";

/// Environment override for the read timeout, in milliseconds.
pub const ENV_READ_TIMEOUT_MS: &str = "RSQLITE_READ_TIMEOUT_MS";

/// Configuration for driving one engine binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Path to the engine binary under test.
    pub binary: PathBuf,
    /// Database file the engine is opened against when a scenario does not
    /// supply its own path. For suite runs only the file name is kept; the
    /// file itself is placed in the scratch directory.
    pub db_path: PathBuf,
    /// Bound on the output drain: a script that has not reached end-of-stream
    /// within this window is treated as hung and its process killed.
    pub read_timeout: Duration,
    /// Scratch directory for suite-run database files. `None` means a
    /// tempdir is created per run and removed afterwards.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ENGINE_BINARY),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            read_timeout: DEFAULT_READ_TIMEOUT,
            scratch_dir: None,
        }
    }
}

impl HarnessConfig {
    /// Default configuration with `RSQLITE_BIN` / `RSQLITE_READ_TIMEOUT_MS`
    /// environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(binary) = std::env::var(ENV_ENGINE_BINARY) {
            if !binary.is_empty() {
                config.binary = PathBuf::from(binary);
            }
        }
        if let Some(timeout) = std::env::var(ENV_READ_TIMEOUT_MS)
            .ok()
            .as_deref()
            .and_then(parse_timeout_ms)
        {
            config.read_timeout = timeout;
        }
        config
    }

    /// File name component of [`Self::db_path`], falling back to the
    /// conventional default when the path has none (e.g. ends in `..`).
    #[must_use]
    pub fn db_file_name(&self) -> PathBuf {
        self.db_path
            .file_name()
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
    }
}

/// Parse a strictly positive millisecond count.
fn parse_timeout_ms(raw: &str) -> Option<Duration> {
    let ms: u64 = raw.trim().parse().ok()?;
    if ms == 0 {
        return None;
    }
    Some(Duration::from_millis(ms))
}

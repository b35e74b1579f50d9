//! Database file lifecycle management.
//!
//! Each scenario must start from a known on-disk state: the persisted
//! database file is removed before the engine is launched and again after the
//! full suite so no artifacts outlive a run.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::{HarnessError, HarnessResult};

/// Remove the database file at `path`, best-effort.
///
/// Absence of the file is not an error: the post-condition is "no file at
/// `path`", and an already-absent file satisfies it.
///
/// # Errors
///
/// Returns [`HarnessError::Reset`] when the file exists but cannot be removed
/// (e.g. permission denied). That is a harness-level setup error, distinct
/// from any test assertion failure.
pub fn reset(path: &Path) -> HarnessResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed database file");
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(HarnessError::Reset {
            path: path.display().to_string(),
            source: error,
        }),
    }
}

//! Black-box conformance harness for a line-oriented database REPL.
//!
//! This crate provides the infrastructure for:
//! - **Process sessions**: spawning, killing, and reopening the engine binary
//!   with piped stdin/stdout
//! - **Script execution**: feeding newline-terminated command batches and
//!   draining the engine's full output under a bounded wait
//! - **Scenario composition**: prebuilt command sequences for boundary,
//!   capacity, and persistence cases
//! - **Transcript assertion**: exact-sequence and positional prefix matching
//!   with the actual output attached to every failure
//!
//! The engine under test is an external collaborator reached only through its
//! process boundary: the harness knows nothing about its storage or SQL
//! dialect beyond what appears on stdout.

pub mod assertion;
pub mod config;
pub mod lifecycle;
pub mod scenario;
pub mod script;
pub mod session;
pub mod suite;
pub mod transcript;

use crate::assertion::TranscriptMismatch;

/// Result type alias used throughout the harness.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can arise while driving the engine.
///
/// The variants map onto the harness error taxonomy: [`HarnessError::Spawn`],
/// [`HarnessError::Reset`], and [`HarnessError::Io`] are setup errors that
/// abort a scenario before any assertion runs; [`HarnessError::Hang`] reports
/// an engine that never reached end-of-stream within the bounded wait; and
/// [`HarnessError::Mismatch`] is an ordinary assertion failure.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// An I/O error from the filesystem or a pipe.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The engine binary could not be launched.
    #[error("failed to launch engine binary `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// A database file could not be removed (absence is never an error).
    #[error("failed to remove database file `{path}`: {source}")]
    Reset {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine did not reach end-of-stream within the bounded wait.
    ///
    /// Carries whatever output was captured before the subprocess was killed,
    /// so a stalled script can still be diagnosed.
    #[error("engine did not reach end-of-stream within {waited_ms} ms ({} line(s) captured)", .partial.len())]
    Hang {
        waited_ms: u64,
        partial: Vec<String>,
    },

    /// The captured transcript did not match the expectation.
    #[error("transcript mismatch: {0}")]
    Mismatch(#[from] TranscriptMismatch),
}

impl HarnessError {
    /// True for errors that occur before any assertion can run (spawn,
    /// reset, pipe I/O). Setup errors abort the current scenario; they are
    /// never test failures.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Spawn { .. } | Self::Reset { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;
    use crate::assertion::TranscriptMismatch;

    #[test]
    fn setup_classification_covers_spawn_and_reset() {
        let spawn = HarnessError::Spawn {
            binary: "missing".to_owned(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let reset = HarnessError::Reset {
            path: "default.db".to_owned(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(spawn.is_setup());
        assert!(reset.is_setup());
    }

    #[test]
    fn hang_and_mismatch_are_not_setup_errors() {
        let hang = HarnessError::Hang {
            waited_ms: 100,
            partial: vec!["db >".to_owned()],
        };
        let mismatch = HarnessError::Mismatch(TranscriptMismatch {
            detail: "expected 2 line(s), got 1".to_owned(),
            actual: vec!["db >".to_owned()],
        });
        assert!(!hang.is_setup());
        assert!(!mismatch.is_setup());
    }

    #[test]
    fn hang_display_reports_wait_and_capture_counts() {
        let hang = HarnessError::Hang {
            waited_ms: 250,
            partial: vec!["db > Executed".to_owned(), "db >".to_owned()],
        };
        let rendered = hang.to_string();
        assert!(rendered.contains("250 ms"));
        assert!(rendered.contains("2 line(s)"));
    }
}

//! Process sessions: one live engine subprocess with piped stdin/stdout.

use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::{HarnessError, HarnessResult};

/// A live handle to one spawned engine process.
///
/// At most one session exists per scenario: [`Session::reopen`] consumes the
/// running process before spawning its successor, and dropping a session
/// kills and reaps whatever is still running, so an engine process can never
/// outlive the scenario that opened it.
#[derive(Debug)]
pub struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    db_path: PathBuf,
}

impl Session {
    /// Launch the engine binary against `db_path`, or against the configured
    /// default database path when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Spawn`] when the binary is missing or fails to
    /// start. That is a fatal setup error, not a protocol-level failure.
    pub fn open(config: &HarnessConfig, db_path: Option<&Path>) -> HarnessResult<Self> {
        let db_path = db_path.unwrap_or(&config.db_path).to_path_buf();
        let mut child = Command::new(&config.binary)
            .arg(&db_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                binary: config.binary.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        info!(
            pid = child.id(),
            binary = %config.binary.display(),
            db = %db_path.display(),
            "opened engine session"
        );
        Ok(Self {
            child,
            stdin,
            stdout,
            db_path,
        })
    }

    /// Kill the current process (non-graceful, no shutdown command), wait for
    /// the kill to take effect, then open a fresh session.
    ///
    /// Reaping before the respawn guarantees the old process has released the
    /// database file before the new one opens it, which the
    /// persistence-across-restart scenarios rely on. The new session runs against
    /// `db_path` when given, else against the same file as the old one.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Spawn`] if the fresh session fails to start.
    pub fn reopen(mut self, config: &HarnessConfig, db_path: Option<&Path>) -> HarnessResult<Self> {
        self.terminate();
        let previous = self.db_path.clone();
        Session::open(config, db_path.or(Some(previous.as_path())))
    }

    /// OS process id of the engine.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Database path this session was opened against.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Liveness probe: true while the engine has not exited.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Take ownership of both pipe ends. A session supports exactly one
    /// script run; the second take fails.
    pub(crate) fn take_streams(&mut self) -> HarnessResult<(ChildStdin, ChildStdout)> {
        match (self.stdin.take(), self.stdout.take()) {
            (Some(stdin), Some(stdout)) => Ok((stdin, stdout)),
            _ => Err(HarnessError::Io(std::io::Error::other(
                "session streams already consumed; open a fresh session per script",
            ))),
        }
    }

    /// Wait for the engine to exit and reap it.
    pub(crate) fn wait_exit(&mut self) -> HarnessResult<ExitStatus> {
        let status = self.child.wait()?;
        debug!(pid = self.child.id(), %status, "engine exited");
        Ok(status)
    }

    /// Kill and reap, best-effort. Safe to call on an already-exited process.
    pub(crate) fn terminate(&mut self) {
        if let Err(error) = self.child.kill() {
            debug!(pid = self.child.id(), %error, "kill on exited engine ignored");
        }
        match self.child.wait() {
            Ok(status) => debug!(pid = self.child.id(), %status, "engine reaped"),
            Err(error) => warn!(pid = self.child.id(), %error, "failed to reap engine"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Session;
    use crate::HarnessError;
    use crate::config::HarnessConfig;

    fn missing_binary_config() -> HarnessConfig {
        HarnessConfig {
            binary: PathBuf::from("./does/not/exist/rust_sqlite"),
            ..HarnessConfig::default()
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_setup_error() {
        let error = Session::open(&missing_binary_config(), None).unwrap_err();
        assert!(matches!(error, HarnessError::Spawn { .. }));
        assert!(error.is_setup());
        assert!(error.to_string().contains("rust_sqlite"));
    }

    #[test]
    fn open_uses_the_explicit_db_path_over_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("other.db");
        // `true` exits immediately and ignores its argument; good enough to
        // observe which path the session records.
        let config = HarnessConfig {
            binary: PathBuf::from("true"),
            ..HarnessConfig::default()
        };
        let session = Session::open(&config, Some(&db)).unwrap();
        assert_eq!(session.db_path(), db.as_path());
    }

    #[test]
    fn second_stream_take_is_rejected() {
        let config = HarnessConfig {
            binary: PathBuf::from("true"),
            ..HarnessConfig::default()
        };
        let mut session = Session::open(&config, None).unwrap();
        let first = session.take_streams();
        assert!(first.is_ok());
        let second = session.take_streams();
        assert!(second.is_err());
    }
}

//! Command script execution: feed a command batch, drain the full reply.
//!
//! The engine is interactive and line-buffered, so every command is flushed
//! as soon as it is written. Output is drained on a dedicated thread that
//! runs concurrently with the writes, so the engine can never stall the
//! writer by filling its stdout pipe buffer. The drain is bounded by the
//! configured read timeout, with the subprocess killed on expiry.
//!
//! Full-drain-to-end-of-stream is deliberate: it tolerates commands whose
//! output spans any number of lines (multi-row selects) without per-command
//! framing. The protocol contract is that a script's final command terminates
//! the engine (`.exit`); a script that omits it ends in [`HarnessError::Hang`]
//! once the bounded wait expires.

use std::io::{BufReader, Read, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::session::Session;
use crate::transcript::{CommandSequence, Transcript};
use crate::{HarnessError, HarnessResult};

/// How long to wait for the drain thread to deliver the partial capture
/// after the hung engine has been killed.
const POST_KILL_HARVEST_WINDOW: Duration = Duration::from_secs(2);

/// Write each command as a newline-terminated line to the session's input,
/// then drain the session's output to end-of-stream and split it into a
/// [`Transcript`].
///
/// # Errors
///
/// - [`HarnessError::Io`] when a pipe write fails (engine died mid-script).
/// - [`HarnessError::Hang`] when end-of-stream is not reached within
///   `timeout`; the engine is killed and the partial capture is attached.
pub fn run_script(
    session: &mut Session,
    commands: &CommandSequence,
    timeout: Duration,
) -> HarnessResult<Transcript> {
    let (mut stdin, stdout) = session.take_streams()?;

    let (sender, receiver) = mpsc::channel();
    let drain = thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut captured = Vec::new();
        let _ = reader.read_to_end(&mut captured);
        let _ = sender.send(captured);
    });

    for command in commands.commands() {
        stdin.write_all(command.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
    }
    debug!(
        pid = session.id(),
        commands = commands.len(),
        "script written; draining output"
    );

    // stdin stays open until the drain completes: the engine's terminating
    // command, not end-of-input, is what ends the exchange.
    let captured = match receiver.recv_timeout(timeout) {
        Ok(captured) => captured,
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                pid = session.id(),
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "engine did not reach end-of-stream; killing it"
            );
            session.terminate();
            let partial = receiver
                .recv_timeout(POST_KILL_HARVEST_WINDOW)
                .unwrap_or_default();
            let _ = drain.join();
            return Err(HarnessError::Hang {
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                partial: Transcript::from_bytes(&partial).into_lines(),
            });
        }
        Err(RecvTimeoutError::Disconnected) => Vec::new(),
    };
    drop(stdin);
    let _ = drain.join();

    let status = session.wait_exit()?;
    let transcript = Transcript::from_bytes(&captured);
    debug!(
        pid = session.id(),
        %status,
        lines = transcript.len(),
        "script complete"
    );
    Ok(transcript)
}

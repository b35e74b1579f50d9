//! Command sequences going into the engine and transcripts coming back.

use serde::{Deserialize, Serialize};

/// An ordered list of command strings, one engine input line each.
///
/// Insertion order is significant (later commands may depend on state built
/// by earlier ones) and the sequence is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSequence(Vec<String>);

impl CommandSequence {
    /// Build a sequence from anything yielding command strings.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(commands.into_iter().map(Into::into).collect())
    }

    /// Commands in send order.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the final command is `terminator`; unterminated scripts can
    /// only end in a bounded-wait kill.
    #[must_use]
    pub fn ends_with(&self, terminator: &str) -> bool {
        self.0.last().is_some_and(|c| c == terminator)
    }
}

impl<S: Into<String>> FromIterator<S> for CommandSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The ordered output lines one script run produced, fully drained to
/// end-of-stream before it is handed to any assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    /// Decode captured stdout bytes into lines: lossy UTF-8, surrounding
    /// whitespace trimmed, then split on `\n` as the sole delimiter.
    ///
    /// The trailing prompt the engine prints before reading `.exit` survives
    /// as a final `"db >"` line (its trailing space is part of the trimmed
    /// whitespace).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim();
        let lines = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('\n').map(str::to_owned).collect()
        };
        Self { lines }
    }

    /// Output lines in emission order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Line counted from the end: `from_end = 1` is the last line,
    /// `from_end = 2` the second-to-last.
    #[must_use]
    pub fn line_from_end(&self, from_end: usize) -> Option<&str> {
        if from_end == 0 {
            return None;
        }
        self.lines
            .len()
            .checked_sub(from_end)
            .map(|idx| self.lines[idx].as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{CommandSequence, Transcript};

    #[test]
    fn from_bytes_trims_the_trailing_prompt_space() {
        let transcript = Transcript::from_bytes(b"db > Executed\ndb > ");
        assert_eq!(transcript.lines(), ["db > Executed", "db >"]);
    }

    #[test]
    fn from_bytes_keeps_interior_lines_verbatim() {
        // Multi-line select output: one row line per row, no per-command
        // framing the harness could rely on.
        let transcript =
            Transcript::from_bytes(b"db > (1, user1, person1@example.com)\nExecuted\ndb > ");
        assert_eq!(
            transcript.lines(),
            [
                "db > (1, user1, person1@example.com)",
                "Executed",
                "db >"
            ]
        );
    }

    #[test]
    fn empty_output_is_an_empty_transcript() {
        assert!(Transcript::from_bytes(b"").is_empty());
        assert!(Transcript::from_bytes(b"  \n ").is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let transcript = Transcript::from_bytes(b"db > \xff\n");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn line_from_end_indexes_like_a_negative_subscript() {
        let transcript = Transcript::from_bytes(b"a\nb\nc");
        assert_eq!(transcript.line_from_end(1), Some("c"));
        assert_eq!(transcript.line_from_end(2), Some("b"));
        assert_eq!(transcript.line_from_end(3), Some("a"));
        assert_eq!(transcript.line_from_end(4), None);
        assert_eq!(transcript.line_from_end(0), None);
    }

    #[test]
    fn command_sequence_tracks_terminator() {
        let terminated = CommandSequence::new(["select", ".exit"]);
        let open_ended = CommandSequence::new(["select"]);
        assert!(terminated.ends_with(".exit"));
        assert!(!open_ended.ends_with(".exit"));
        assert_eq!(terminated.len(), 2);
    }

    proptest! {
        #[test]
        fn line_from_end_agrees_with_forward_indexing(
            lines in proptest::collection::vec("[a-z]{1,8}", 1..16),
        ) {
            let joined = lines.join("\n");
            let transcript = Transcript::from_bytes(joined.as_bytes());
            prop_assert_eq!(transcript.len(), lines.len());
            for (offset, expected) in lines.iter().rev().enumerate() {
                prop_assert_eq!(transcript.line_from_end(offset + 1), Some(expected.as_str()));
            }
        }
    }
}

//! Transcript assertions: exact sequence equality and positional prefix
//! matching.
//!
//! A mismatch always carries the full actual transcript: when a scenario
//! fails, the captured output is the only diagnostic there is. There are no
//! retries and no fuzzy matching; a single mismatch is a hard failure.

use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// What a scenario expects of its captured transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// The transcript must equal these lines element-for-element: same
    /// length, same order. Used for fully deterministic transcripts.
    ExactSequence(Vec<String>),
    /// The line at `from_end` (1 = last, 2 = second-to-last) must start with
    /// `prefix`; the remainder is not checked. Used when a suffix such as a
    /// row count is an engine-internal detail not worth hard-coding.
    LinePrefix { from_end: usize, prefix: String },
}

impl Expectation {
    /// Exact full-sequence expectation.
    pub fn exact<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExactSequence(lines.into_iter().map(Into::into).collect())
    }

    /// Prefix expectation on a single line counted from the end.
    pub fn line_prefix(from_end: usize, prefix: impl Into<String>) -> Self {
        Self::LinePrefix {
            from_end,
            prefix: prefix.into(),
        }
    }

    /// Judge `transcript` against this expectation.
    ///
    /// # Errors
    ///
    /// Returns a [`TranscriptMismatch`] describing the first divergence, with
    /// the actual lines attached.
    pub fn check(&self, transcript: &Transcript) -> Result<(), TranscriptMismatch> {
        match self {
            Self::ExactSequence(expected) => check_exact(expected, transcript),
            Self::LinePrefix { from_end, prefix } => check_prefix(*from_end, prefix, transcript),
        }
    }
}

fn check_exact(expected: &[String], transcript: &Transcript) -> Result<(), TranscriptMismatch> {
    let actual = transcript.lines();
    if actual.len() != expected.len() {
        return Err(TranscriptMismatch::new(
            format!(
                "expected {} line(s), got {}; expected transcript: {expected:?}",
                expected.len(),
                actual.len()
            ),
            transcript,
        ));
    }
    for (index, (want, got)) in expected.iter().zip(actual).enumerate() {
        if want != got {
            return Err(TranscriptMismatch::new(
                format!("line {index} differs: expected {want:?}, got {got:?}"),
                transcript,
            ));
        }
    }
    Ok(())
}

fn check_prefix(
    from_end: usize,
    prefix: &str,
    transcript: &Transcript,
) -> Result<(), TranscriptMismatch> {
    let Some(line) = transcript.line_from_end(from_end) else {
        return Err(TranscriptMismatch::new(
            format!(
                "transcript has {} line(s), no line {from_end} from the end",
                transcript.len()
            ),
            transcript,
        ));
    };
    if !line.starts_with(prefix) {
        return Err(TranscriptMismatch::new(
            format!("line {from_end} from the end is {line:?}, expected prefix {prefix:?}"),
            transcript,
        ));
    }
    Ok(())
}

/// An assertion failure with the captured transcript attached for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{detail}; actual transcript: {actual:?}")]
pub struct TranscriptMismatch {
    /// Human-readable description of the first divergence.
    pub detail: String,
    /// The full captured line sequence.
    pub actual: Vec<String>,
}

impl TranscriptMismatch {
    fn new(detail: String, transcript: &Transcript) -> Self {
        Self {
            detail,
            actual: transcript.lines().to_vec(),
        }
    }
}

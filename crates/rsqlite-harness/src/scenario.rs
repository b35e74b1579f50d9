//! Scenario composition: prebuilt command sequences and their expected
//! transcripts.
//!
//! Boundary scenarios bracket the engine's validation thresholds from both
//! sides (the maximum permitted length and one character beyond it): an
//! off-by-one length check is only demonstrated by the pair, never by the
//! invalid case alone.

use serde::{Deserialize, Serialize};

use crate::assertion::Expectation;
use crate::transcript::CommandSequence;

/// Prompt token the engine prints before reading each command.
pub const PROMPT: &str = "db > ";

/// Command that terminates the engine cleanly, flushing pending output.
pub const EXIT_COMMAND: &str = ".exit";

/// Maximum username length the engine accepts.
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum email length the engine accepts.
pub const MAX_EMAIL_LEN: usize = 255;

/// Declared row capacity of the engine's single table.
pub const ROW_CAPACITY: usize = 1400;

/// Inserts issued by the bulk-fill scenario: one past capacity, so the final
/// insert must be rejected.
pub const BULK_FILL_COUNT: usize = ROW_CAPACITY + 1;

/// Prefix of the capacity-exceeded line. The row count after the colon is an
/// engine-internal detail and is not asserted.
pub const TABLE_FULL_PREFIX: &str = "db > table is full of rows";

/// A named command sequence paired with its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub commands: CommandSequence,
    pub expectation: Expectation,
}

impl Scenario {
    fn new(name: &str, commands: CommandSequence, expectation: Expectation) -> Self {
        Self {
            name: name.to_owned(),
            commands,
            expectation,
        }
    }
}

/// The canonical insert command for row `id`.
#[must_use]
pub fn insert_command(id: usize) -> String {
    format!("insert {id} user{id} person{id}@example.com")
}

/// The fixed single-row fixture: insert, select it back, exit.
#[must_use]
pub fn single_row_round_trip() -> Scenario {
    Scenario::new(
        "single_row_round_trip",
        CommandSequence::new([insert_command(1), "select".to_owned(), EXIT_COMMAND.to_owned()]),
        Expectation::exact([
            "db > Executed",
            "db > (1, user1, person1@example.com)",
            "Executed",
            "db >",
        ]),
    )
}

/// Bulk fill: sequential inserts past the declared row capacity, exercising
/// the capacity-exceeded failure path. Only the second-to-last line is
/// asserted, by prefix.
#[must_use]
pub fn bulk_fill() -> Scenario {
    let mut commands: Vec<String> = (1..=BULK_FILL_COUNT).map(insert_command).collect();
    commands.push(EXIT_COMMAND.to_owned());
    Scenario::new(
        "bulk_fill_past_capacity",
        CommandSequence::new(commands),
        Expectation::line_prefix(2, TABLE_FULL_PREFIX),
    )
}

/// Maximum-length boundary: username and email at exactly their limits must
/// be accepted and echoed back unmodified.
#[must_use]
pub fn max_length_boundary() -> Scenario {
    let username = "a".repeat(MAX_USERNAME_LEN);
    let email = "a".repeat(MAX_EMAIL_LEN);
    Scenario::new(
        "max_length_boundary",
        boundary_commands(&username, &email),
        Expectation::exact([
            "db > Executed".to_owned(),
            format!("db > (1, {username}, {email})"),
            "Executed".to_owned(),
            "db >".to_owned(),
        ]),
    )
}

/// Over-length boundary: one character past each limit must be rejected with
/// the length-validation message, while the following select and exit still
/// execute; rejection must not corrupt the session.
#[must_use]
pub fn over_length_boundary() -> Scenario {
    let username = "a".repeat(MAX_USERNAME_LEN + 1);
    let email = "a".repeat(MAX_EMAIL_LEN + 1);
    Scenario::new(
        "over_length_boundary",
        boundary_commands(&username, &email),
        Expectation::exact(["db > String is too long", "db > Executed", "db >"]),
    )
}

/// Unknown statement and unknown meta command: each yields its rejection
/// line and leaves the session usable.
#[must_use]
pub fn unrecognized_commands() -> Scenario {
    Scenario::new(
        "unrecognized_commands",
        CommandSequence::new(["frobnicate", ".frobnicate", EXIT_COMMAND]),
        Expectation::exact([
            "db > Unrecognized command",
            "db > Unrecognized Meta Command",
            "db >",
        ]),
    )
}

/// First half of the persistence scenario: seed one row and exit cleanly so
/// the engine flushes it to disk.
#[must_use]
pub fn persistence_seed() -> Scenario {
    Scenario::new(
        "persistence_seed",
        CommandSequence::new([insert_command(1), EXIT_COMMAND.to_owned()]),
        Expectation::exact(["db > Executed", "db >"]),
    )
}

/// Second half of the persistence scenario, run in a reopened session over
/// the same file: the seeded row must still come back unchanged.
#[must_use]
pub fn persistence_probe() -> Scenario {
    Scenario::new(
        "persistence_probe",
        CommandSequence::new(["select", EXIT_COMMAND]),
        Expectation::exact([
            "db > (1, user1, person1@example.com)",
            "Executed",
            "db >",
        ]),
    )
}

/// The single-session scenarios in suite order. The two-session persistence
/// pair is orchestrated separately by the suite.
#[must_use]
pub fn single_session_scenarios() -> Vec<Scenario> {
    vec![
        single_row_round_trip(),
        max_length_boundary(),
        over_length_boundary(),
        unrecognized_commands(),
        bulk_fill(),
    ]
}

fn boundary_commands(username: &str, email: &str) -> CommandSequence {
    CommandSequence::new([
        format!("insert 1 {username} {email}"),
        "select".to_owned(),
        EXIT_COMMAND.to_owned(),
    ])
}

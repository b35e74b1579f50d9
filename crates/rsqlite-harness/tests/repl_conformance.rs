//! End-to-end conformance runs against the `refdb` reference engine.
//!
//! Every test spawns the real binary and drives it over its pipes, the same
//! path the harness takes against the engine under test.

use std::path::PathBuf;
use std::time::Duration;

use rsqlite_harness::HarnessError;
use rsqlite_harness::config::HarnessConfig;
use rsqlite_harness::scenario;
use rsqlite_harness::script::run_script;
use rsqlite_harness::session::Session;
use rsqlite_harness::suite::{PERSISTENCE_SCENARIO, SuiteRunner};
use rsqlite_harness::transcript::CommandSequence;

fn refdb_config(dir: &tempfile::TempDir) -> HarnessConfig {
    HarnessConfig {
        binary: PathBuf::from(env!("CARGO_BIN_EXE_refdb")),
        db_path: dir.path().join("default.db"),
        read_timeout: Duration::from_secs(10),
        scratch_dir: None,
    }
}

fn run_scenario(config: &HarnessConfig, scenario: &scenario::Scenario) {
    let mut session = Session::open(config, None).unwrap();
    let transcript = run_script(&mut session, &scenario.commands, config.read_timeout).unwrap();
    scenario
        .expectation
        .check(&transcript)
        .unwrap_or_else(|mismatch| panic!("{}: {mismatch}", scenario.name));
}

#[test]
fn single_row_round_trip_matches_the_fixture_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = refdb_config(&dir);

    let mut session = Session::open(&config, None).unwrap();
    let commands = CommandSequence::new(["insert 1 user1 person1@example.com", "select", ".exit"]);
    let transcript = run_script(&mut session, &commands, config.read_timeout).unwrap();

    assert_eq!(
        transcript.lines(),
        [
            "db > Executed",
            "db > (1, user1, person1@example.com)",
            "Executed",
            "db >"
        ]
    );
}

#[test]
fn max_length_boundary_is_accepted_and_echoed() {
    let dir = tempfile::tempdir().unwrap();
    run_scenario(&refdb_config(&dir), &scenario::max_length_boundary());
}

#[test]
fn over_length_boundary_is_rejected_without_killing_the_session() {
    let dir = tempfile::tempdir().unwrap();
    run_scenario(&refdb_config(&dir), &scenario::over_length_boundary());
}

#[test]
fn unrecognized_commands_leave_the_session_usable() {
    let dir = tempfile::tempdir().unwrap();
    run_scenario(&refdb_config(&dir), &scenario::unrecognized_commands());
}

#[test]
fn bulk_fill_reports_table_full_on_the_second_to_last_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = refdb_config(&dir);
    let scenario = scenario::bulk_fill();

    let mut session = Session::open(&config, None).unwrap();
    let transcript = run_script(&mut session, &scenario.commands, config.read_timeout).unwrap();

    scenario.expectation.check(&transcript).unwrap();
    // 1400 accepted inserts, one rejection, one trailing prompt.
    assert_eq!(transcript.len(), scenario::ROW_CAPACITY + 2);
}

#[test]
fn rows_persist_across_a_kill_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = refdb_config(&dir);
    let seed = scenario::persistence_seed();
    let probe = scenario::persistence_probe();

    let mut session = Session::open(&config, None).unwrap();
    let transcript = run_script(&mut session, &seed.commands, config.read_timeout).unwrap();
    seed.expectation.check(&transcript).unwrap();

    let mut session = session.reopen(&config, None).unwrap();
    let transcript = run_script(&mut session, &probe.commands, config.read_timeout).unwrap();
    probe.expectation.check(&transcript).unwrap();
}

#[test]
fn unterminated_script_ends_in_a_bounded_hang_with_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = refdb_config(&dir);

    let mut session = Session::open(&config, None).unwrap();
    let commands = CommandSequence::new(["insert 1 user1 person1@example.com"]);
    let error = run_script(&mut session, &commands, Duration::from_millis(500)).unwrap_err();

    match error {
        HarnessError::Hang { partial, waited_ms } => {
            assert_eq!(waited_ms, 500);
            assert_eq!(partial, ["db > Executed", "db >"]);
        }
        other => panic!("expected Hang, got {other}"),
    }
    assert!(!session.is_running(), "hung engine must be killed");
}

#[test]
fn full_suite_passes_against_the_reference_engine() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig {
        scratch_dir: Some(dir.path().to_path_buf()),
        ..refdb_config(&dir)
    };

    let report = SuiteRunner::new(config).run().unwrap();

    assert!(report.passed, "triage: {}", report.triage_line());
    let names: Vec<&str> = report.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"single_row_round_trip"));
    assert!(names.contains(&"max_length_boundary"));
    assert!(names.contains(&"over_length_boundary"));
    assert!(names.contains(&"bulk_fill_past_capacity"));
    assert!(names.contains(&PERSISTENCE_SCENARIO));
    assert!(!dir.path().join("default.db").exists(), "suite teardown must remove the database file");
}

#[test]
fn suite_filter_selects_by_substring() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig {
        scratch_dir: Some(dir.path().to_path_buf()),
        ..refdb_config(&dir)
    };

    let report = SuiteRunner::new(config)
        .with_filter(Some("boundary".to_owned()))
        .run()
        .unwrap();

    assert!(report.passed);
    assert_eq!(report.scenarios.len(), 2);
    assert!(report.scenarios.iter().all(|s| s.name.contains("boundary")));
}

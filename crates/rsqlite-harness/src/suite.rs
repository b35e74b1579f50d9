//! Suite orchestration: run every scenario against one engine binary and
//! produce a structured report.
//!
//! Scenarios execute one at a time, single-threaded. Each gets a fresh
//! database file (lifecycle reset before it starts), and the file is reset
//! again after the suite so no artifacts outlive the run. A setup error
//! aborts only its own scenario; an assertion mismatch is recorded and the
//! suite moves on. Nothing is retried: every scenario is deterministic
//! given a clean database file.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::scenario::{self, Scenario};
use crate::script::run_script;
use crate::session::Session;
use crate::{HarnessError, HarnessResult, lifecycle};

/// Name of the two-session persistence scenario orchestrated by the suite.
pub const PERSISTENCE_SCENARIO: &str = "persistence_across_reopen";

/// How a scenario failed, mirroring the harness error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Binary failed to launch, reset denied, or a pipe broke.
    Setup,
    /// The engine never reached end-of-stream within the bounded wait.
    Hang,
    /// The captured transcript did not match the expectation.
    Mismatch,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    /// Rendered failure, when the scenario did not pass.
    pub failure: Option<String>,
    pub failure_kind: Option<FailureKind>,
    /// Captured output attached for diagnosis on hang or mismatch.
    pub actual: Option<Vec<String>>,
    pub duration_ms: u64,
}

/// Structured report for a full suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Engine binary the suite ran against.
    pub binary: String,
    /// Database file path used for the run.
    pub db_path: String,
    pub scenarios: Vec<ScenarioReport>,
    pub total_duration_ms: u64,
    /// True iff every scenario passed.
    pub passed: bool,
}

impl SuiteReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One-line summary for logs and CI output.
    #[must_use]
    pub fn triage_line(&self) -> String {
        let failed: Vec<&str> = self
            .scenarios
            .iter()
            .filter(|s| !s.passed)
            .map(|s| s.name.as_str())
            .collect();
        format!(
            "scenarios={} failed={} status={}{}",
            self.scenarios.len(),
            failed.len(),
            if self.passed { "pass" } else { "FAIL" },
            if failed.is_empty() {
                String::new()
            } else {
                format!(" [{}]", failed.join(", "))
            }
        )
    }
}

/// Write a pretty JSON report to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] on filesystem failures.
pub fn write_report(path: &Path, report: &SuiteReport) -> HarnessResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let payload = report
        .to_json()
        .map_err(|error| std::io::Error::other(format!("report serialize failed: {error}")))?;
    std::fs::write(path, payload)?;
    Ok(())
}

/// Runs the built-in scenarios against one configured engine binary.
pub struct SuiteRunner {
    config: HarnessConfig,
    filter: Option<String>,
}

impl SuiteRunner {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            filter: None,
        }
    }

    /// Only run scenarios whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Execute the suite and return the structured report.
    ///
    /// # Errors
    ///
    /// Returns an error only for run-wide setup failures (scratch directory
    /// creation); per-scenario errors are folded into the report.
    pub fn run(&self) -> HarnessResult<SuiteReport> {
        // The database lives in the scratch directory; a tempdir (removed on
        // drop) when none is configured.
        let _scratch_guard;
        let db_path = match &self.config.scratch_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.join(self.config.db_file_name())
            }
            None => {
                let tempdir = tempfile::tempdir()?;
                let path = tempdir.path().join(self.config.db_file_name());
                _scratch_guard = tempdir;
                path
            }
        };

        let started = Instant::now();
        let mut reports = Vec::new();

        for scenario in scenario::single_session_scenarios() {
            if !self.selected(&scenario.name) {
                continue;
            }
            reports.push(self.run_reported(&scenario.name, &db_path, |db| {
                self.run_single(&scenario, db)
            }));
        }
        if self.selected(PERSISTENCE_SCENARIO) {
            reports.push(
                self.run_reported(PERSISTENCE_SCENARIO, &db_path, |db| self.run_persistence(db)),
            );
        }

        // Suite teardown: leave no artifacts behind.
        if let Err(error) = lifecycle::reset(&db_path) {
            warn!(%error, "suite teardown reset failed");
        }

        let passed = reports.iter().all(|r| r.passed);
        let report = SuiteReport {
            binary: self.config.binary.display().to_string(),
            db_path: db_path.display().to_string(),
            scenarios: reports,
            total_duration_ms: duration_ms(started),
            passed,
        };
        info!(triage = %report.triage_line(), "suite complete");
        Ok(report)
    }

    fn selected(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|f| name.contains(f))
    }

    /// Reset the database, execute one scenario body, and fold the outcome
    /// into a [`ScenarioReport`].
    fn run_reported<F>(&self, name: &str, db_path: &Path, body: F) -> ScenarioReport
    where
        F: FnOnce(&Path) -> HarnessResult<()>,
    {
        let started = Instant::now();
        let outcome = lifecycle::reset(db_path).and_then(|()| body(db_path));
        let duration_ms = duration_ms(started);
        match outcome {
            Ok(()) => {
                info!(scenario = name, duration_ms, "scenario passed");
                ScenarioReport {
                    name: name.to_owned(),
                    passed: true,
                    failure: None,
                    failure_kind: None,
                    actual: None,
                    duration_ms,
                }
            }
            Err(error) => {
                warn!(scenario = name, %error, "scenario failed");
                ScenarioReport {
                    name: name.to_owned(),
                    passed: false,
                    failure: Some(error.to_string()),
                    failure_kind: Some(classify(&error)),
                    actual: captured_lines(error),
                    duration_ms,
                }
            }
        }
    }

    fn run_single(&self, scenario: &Scenario, db_path: &Path) -> HarnessResult<()> {
        let mut session = Session::open(&self.config, Some(db_path))?;
        let transcript = run_script(&mut session, &scenario.commands, self.config.read_timeout)?;
        scenario.expectation.check(&transcript)?;
        Ok(())
    }

    /// Seed a row, kill and reopen the engine over the same file, and probe
    /// that the row survived the restart.
    fn run_persistence(&self, db_path: &Path) -> HarnessResult<()> {
        let seed = scenario::persistence_seed();
        let probe = scenario::persistence_probe();

        let mut session = Session::open(&self.config, Some(db_path))?;
        let transcript = run_script(&mut session, &seed.commands, self.config.read_timeout)?;
        seed.expectation.check(&transcript)?;

        let mut session = session.reopen(&self.config, Some(db_path))?;
        let transcript = run_script(&mut session, &probe.commands, self.config.read_timeout)?;
        probe.expectation.check(&transcript)?;
        Ok(())
    }
}

fn classify(error: &HarnessError) -> FailureKind {
    match error {
        HarnessError::Hang { .. } => FailureKind::Hang,
        HarnessError::Mismatch(_) => FailureKind::Mismatch,
        HarnessError::Io(_) | HarnessError::Spawn { .. } | HarnessError::Reset { .. } => {
            FailureKind::Setup
        }
    }
}

fn captured_lines(error: HarnessError) -> Option<Vec<String>> {
    match error {
        HarnessError::Hang { partial, .. } => Some(partial),
        HarnessError::Mismatch(mismatch) => Some(mismatch.actual),
        _ => None,
    }
}

fn duration_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

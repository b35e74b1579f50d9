//! Conformance suite runner — drives the engine binary through every
//! built-in scenario and reports the results.
//!
//! ```sh
//! conformance_runner --binary ./target/debug/rust_sqlite --output results.json
//! ```
//!
//! Exit codes: `0` all scenarios passed, `1` failures or a run-wide setup
//! error, `2` usage error.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use rsqlite_harness::config::HarnessConfig;
use rsqlite_harness::suite::{SuiteRunner, write_report};

#[derive(Debug, Clone)]
struct RunnerOptions {
    config: HarnessConfig,
    output: Option<PathBuf>,
    filter: Option<String>,
    json: bool,
    show_help: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let code = run(std::env::args_os());
    std::process::exit(code);
}

fn run<I>(args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            let _ = write_usage(&mut std::io::stderr());
            return 2;
        }
    };
    if options.show_help {
        return if write_usage(&mut std::io::stdout()).is_ok() {
            0
        } else {
            1
        };
    }

    let runner = SuiteRunner::new(options.config).with_filter(options.filter);
    let report = match runner.run() {
        Ok(report) => report,
        Err(error) => {
            eprintln!("error: {error}");
            return 1;
        }
    };

    if options.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("error: {error}");
                return 1;
            }
        }
    } else {
        for scenario in &report.scenarios {
            if scenario.passed {
                println!("PASS {} ({} ms)", scenario.name, scenario.duration_ms);
            } else {
                println!(
                    "FAIL {} ({} ms): {}",
                    scenario.name,
                    scenario.duration_ms,
                    scenario.failure.as_deref().unwrap_or("unknown failure")
                );
                if let Some(actual) = &scenario.actual {
                    for line in actual {
                        println!("  | {line}");
                    }
                }
            }
        }
        println!("{}", report.triage_line());
    }

    if let Some(path) = &options.output {
        if let Err(error) = write_report(path, &report) {
            eprintln!("error: {error}");
            return 1;
        }
    }

    i32::from(!report.passed)
}

fn parse_args<I>(args: I) -> Result<RunnerOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut options = RunnerOptions {
        config: HarnessConfig::from_env(),
        output: None,
        filter: None,
        json: false,
        show_help: false,
    };

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        match arg.as_ref() {
            "-h" | "--help" => options.show_help = true,
            "--json" => options.json = true,
            "--binary" => options.config.binary = PathBuf::from(required(&mut iter, "--binary")?),
            "--db" => options.config.db_path = PathBuf::from(required(&mut iter, "--db")?),
            "--scratch" => {
                options.config.scratch_dir = Some(PathBuf::from(required(&mut iter, "--scratch")?));
            }
            "--output" => options.output = Some(PathBuf::from(required(&mut iter, "--output")?)),
            "--filter" => options.filter = Some(required(&mut iter, "--filter")?),
            "--timeout-ms" => {
                let raw = required(&mut iter, "--timeout-ms")?;
                let ms: u64 = raw
                    .parse()
                    .map_err(|_| format!("`--timeout-ms` expects an integer, got `{raw}`"))?;
                if ms == 0 {
                    return Err("`--timeout-ms` must be positive".to_owned());
                }
                options.config.read_timeout = Duration::from_millis(ms);
            }
            other => return Err(format!("unrecognized argument `{other}`")),
        }
    }
    Ok(options)
}

fn required<I>(iter: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item = OsString>,
{
    iter.next()
        .map(|value| value.to_string_lossy().into_owned())
        .ok_or_else(|| format!("`{flag}` expects a value"))
}

fn write_usage<W: std::io::Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "usage: conformance_runner [options]

options:
  --binary <path>      engine binary under test (default ./target/debug/rust_sqlite,
                       env RSQLITE_BIN)
  --db <path>          database file name used for the run (default default.db)
  --scratch <dir>      directory for run artifacts (default: fresh tempdir)
  --timeout-ms <n>     bound on each script's output drain (default 10000,
                       env RSQLITE_READ_TIMEOUT_MS)
  --filter <substr>    only run scenarios whose name contains <substr>
  --output <path>      write the JSON report to <path>
  --json               print the JSON report to stdout instead of a summary
  -h, --help           show this help"
    )
}

//! Minimal reference engine speaking the line protocol the harness drives.
//!
//! One fixed-schema table (`id`, `username`, `email`) behind a prompt-driven
//! REPL: `insert`, `select`, and `.exit`. Rows are flushed to the database
//! file only on a clean `.exit`, so a killed process loses unflushed work,
//! matching the observable contract the conformance suite asserts against
//! the real engine. The crate's integration tests run their suite against
//! this binary.

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const PROMPT: &str = "db > ";
const MAX_USERNAME_LEN: usize = 32;
const MAX_EMAIL_LEN: usize = 255;
const MAX_ROWS: usize = 1400;
const DEFAULT_DB_PATH: &str = "default.db";

fn main() {
    let db_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

    let mut table = match Table::load(&db_path) {
        Ok(table) => table,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut input = BufReader::new(stdin.lock());
    let mut output = io::stdout();
    let code = run(&mut table, &mut input, &mut output);
    std::process::exit(code);
}

/// The REPL loop, generic over its streams so tests can drive it without a
/// process.
fn run<R: BufRead, W: Write>(table: &mut Table, input: &mut R, output: &mut W) -> i32 {
    let mut buf = String::new();
    loop {
        if write!(output, "{PROMPT}").and_then(|()| output.flush()).is_err() {
            return 1;
        }
        buf.clear();
        match input.read_line(&mut buf) {
            // End of input without `.exit`: abnormal termination, nothing is
            // flushed.
            Ok(0) => return 0,
            Ok(_) => {}
            Err(_) => return 1,
        }
        let line = buf.trim();

        if let Some(meta) = line.strip_prefix('.') {
            if meta == "exit" {
                if let Err(error) = table.flush() {
                    let _ = writeln!(output, "error: {error}");
                    return 1;
                }
                return 0;
            }
            let _ = writeln!(output, "Unrecognized Meta Command");
            continue;
        }

        match execute_statement(table, line, output) {
            Ok(()) => {
                let _ = writeln!(output, "Executed");
            }
            Err(message) => {
                let _ = writeln!(output, "{message}");
            }
        }
    }
}

fn execute_statement<W: Write>(
    table: &mut Table,
    line: &str,
    output: &mut W,
) -> Result<(), String> {
    if line.starts_with("insert") {
        let row = parse_insert(line)?;
        table.insert(row)
    } else if line.starts_with("select") {
        for row in &table.rows {
            let _ = writeln!(output, "({}, {}, {})", row.id, row.username, row.email);
        }
        Ok(())
    } else {
        Err("Unrecognized command".to_owned())
    }
}

fn parse_insert(line: &str) -> Result<Row, String> {
    let mut words = line.split_whitespace();
    let _insert = words.next();
    let (Some(id), Some(username), Some(email), None) =
        (words.next(), words.next(), words.next(), words.next())
    else {
        return Err("Unrecognized command".to_owned());
    };
    let id: u32 = id.parse().map_err(|_| "Unrecognized command".to_owned())?;
    if username.len() > MAX_USERNAME_LEN || email.len() > MAX_EMAIL_LEN {
        return Err("String is too long".to_owned());
    }
    Ok(Row {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
    })
}

struct Row {
    id: u32,
    username: String,
    email: String,
}

/// The single table plus the file its rows persist to.
struct Table {
    path: PathBuf,
    rows: Vec<Row>,
}

impl Table {
    /// Load persisted rows, or start empty when the file is absent.
    fn load(path: &Path) -> Result<Self, String> {
        let rows = match std::fs::read_to_string(path) {
            Ok(contents) => parse_records(&contents)?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(format!("cannot read {}: {error}", path.display())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    fn insert(&mut self, row: Row) -> Result<(), String> {
        if self.rows.len() >= MAX_ROWS {
            return Err(format!("table is full of rows: {MAX_ROWS}"));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Write all rows to the database file. Fields never contain whitespace
    /// (the protocol splits commands on it), so tab-separated records are
    /// unambiguous.
    fn flush(&self) -> Result<(), String> {
        let mut contents = String::new();
        for row in &self.rows {
            contents.push_str(&format!("{}\t{}\t{}\n", row.id, row.username, row.email));
        }
        std::fs::write(&self.path, contents)
            .map_err(|error| format!("cannot write {}: {error}", self.path.display()))
    }
}

fn parse_records(contents: &str) -> Result<Vec<Row>, String> {
    let mut rows = Vec::new();
    for record in contents.lines() {
        let mut fields = record.split('\t');
        let (Some(id), Some(username), Some(email)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(format!("corrupt record: {record:?}"));
        };
        let id: u32 = id
            .parse()
            .map_err(|_| format!("corrupt record id: {record:?}"))?;
        rows.push(Row {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
        });
    }
    Ok(rows)
}

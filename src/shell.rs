//! Interactive Shell - menu loop for load / query / list tables / exit
//!
//! This is the only place that swallows errors: each failed action is logged
//! with its full cause chain and the user gets a generic message pointing at
//! the error log. The loop keeps going until Exit or end of input.

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::ingestion::{CellValue, CsvSource, DatasetSource};
use crate::logging::ERROR_LOG_TARGET;
use crate::reconcile::{MismatchChoice, ReconciliationController, Resolution, ResolutionPrompt};
use crate::schema::{ColumnSchema, ComparisonMode, TableSchema};
use crate::store::RelationalStore;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

const WELCOME: &str = "Welcome to SQL Interactive Assistant!";
const MENU: &str = "What would you like to do?\n\
                    1. Load CSV file into database\n\
                    2. Run SQL query\n\
                    3. List tables\n\
                    4. Exit\n\
                    Enter your choice (1-4): ";
const MISMATCH_HELP: &str = "Schemas are not the same. You can choose to overwrite the table \
                             with the new schema, choose another table name to use, or skip \
                             the process and do nothing.";
const MISMATCH_MENU: &str = "1. Overwrite\n2. Rename\n3. Skip\nEnter your choice (1-3): ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Load,
    Query,
    ListTables,
    Exit,
}

impl MenuAction {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuAction::Load),
            "2" => Some(MenuAction::Query),
            "3" => Some(MenuAction::ListTables),
            "4" => Some(MenuAction::Exit),
            _ => None,
        }
    }
}

/// Line-oriented prompt over any reader/writer pair
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `text` and read one line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Like `prompt`, but end of input is an error.
    fn expect_line(&mut self, text: &str) -> Result<String> {
        self.prompt(text)?
            .ok_or_else(|| AssistantError::UserInputInvalid("input ended unexpectedly".to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> ResolutionPrompt for Console<R, W> {
    fn resolve(
        &mut self,
        _table: &str,
        existing: &TableSchema,
        incoming: &ColumnSchema,
    ) -> Result<Resolution> {
        self.say(MISMATCH_HELP)?;
        self.say(&format!("  existing: {}", existing.data_column_names().join(", ")))?;
        self.say(&format!("  incoming: {}", incoming.names().join(", ")))?;

        let choice = self.prompt(MISMATCH_MENU)?.unwrap_or_default();
        match MismatchChoice::parse_or_skip(&choice) {
            MismatchChoice::Overwrite => {
                self.say("Overwriting table...")?;
                Ok(Resolution::Overwrite)
            }
            MismatchChoice::Rename => {
                self.say("Creating new table...")?;
                let name = self.expect_line("Enter a new name for the table: ")?;
                Ok(Resolution::Rename(name.trim().to_string()))
            }
            MismatchChoice::Skip => {
                self.say("Skipping...")?;
                Ok(Resolution::Skip)
            }
        }
    }
}

pub struct InteractiveShell<'a, S: RelationalStore, R, W> {
    store: &'a mut S,
    console: Console<R, W>,
    mode: ComparisonMode,
    error_log: PathBuf,
}

impl<'a, S: RelationalStore, R: BufRead, W: Write> InteractiveShell<'a, S, R, W> {
    pub fn new(store: &'a mut S, input: R, output: W, config: &AssistantConfig) -> Self {
        Self {
            store,
            console: Console::new(input, output),
            mode: config.comparison,
            error_log: config.error_log.clone(),
        }
    }

    /// Run until Exit or end of input. Only failures to write to the output
    /// escape this loop.
    pub fn run(&mut self) -> Result<()> {
        self.console.say(WELCOME)?;

        loop {
            let Some(raw) = self.console.prompt(MENU)? else {
                info!("Input closed, leaving shell");
                break;
            };

            let action = MenuAction::parse(&raw);
            if action == Some(MenuAction::Exit) {
                break;
            }

            if let Err(err) = self.dispatch(action, &raw) {
                self.report(err)?;
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, action: Option<MenuAction>, raw: &str) -> Result<()> {
        match action {
            Some(MenuAction::Load) => self.load(),
            Some(MenuAction::Query) => self.query(),
            Some(MenuAction::ListTables) => self.list_tables(),
            Some(MenuAction::Exit) => Ok(()),
            None => Err(AssistantError::UserInputInvalid(format!(
                "unrecognised menu choice '{}'",
                raw.trim()
            ))),
        }
    }

    fn report(&mut self, err: AssistantError) -> Result<()> {
        error!(target: ERROR_LOG_TARGET, "Error: {:?}", anyhow::Error::from(err));
        self.console.say(&format!(
            "An error has occurred, check {} for details.",
            self.error_log.display()
        ))
    }

    fn load(&mut self) -> Result<()> {
        let csv_path = self.console.expect_line("Name of CSV file? ")?;
        let table = self.console.expect_line("Name of table? ")?;
        let table = table.trim();
        if table.is_empty() {
            return Err(AssistantError::UserInputInvalid(
                "a table name is required".to_string(),
            ));
        }

        let dataset = CsvSource::new(csv_path.trim()).load()?;
        let outcome = ReconciliationController::new(&mut *self.store, self.mode).reconcile(
            &dataset,
            table,
            &mut self.console,
        )?;

        self.console.say(&outcome.to_string())
    }

    fn query(&mut self) -> Result<()> {
        let sql = self.console.expect_line("Enter SQL query: ")?;
        let result = self.store.query(&sql)?;
        for row in &result.rows {
            self.console.say(&format_row(row))?;
        }
        Ok(())
    }

    fn list_tables(&mut self) -> Result<()> {
        let tables = self.store.table_names()?;
        self.console.say("Tables in database:")?;
        for table in tables {
            self.console.say(&format!(" * {}", table))?;
        }
        Ok(())
    }
}

/// Render a row as a tuple, e.g. `(1, 'Ford', 2010, 12.5)`.
pub fn format_row(row: &[CellValue]) -> String {
    let cells: Vec<String> = row.iter().map(format_cell).collect();
    if cells.len() == 1 {
        format!("({},)", cells[0])
    } else {
        format!("({})", cells.join(", "))
    }
}

fn format_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => "None".to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Real(f) => format_real(*f),
        CellValue::Text(s) => quote_text(s),
        CellValue::Blob(bytes) => {
            let mut out = String::from("b'");
            for b in bytes {
                match b {
                    b'\\' => out.push_str("\\\\"),
                    b'\'' => out.push_str("\\'"),
                    0x20..=0x7e => out.push(*b as char),
                    _ => out.push_str(&format!("\\x{:02x}", b)),
                }
            }
            out.push('\'');
            out
        }
    }
}

/// Shortest round-trip form; exponent notation below 1e-4 and from 1e16 up,
/// written with a signed two-digit exponent (`1e+16`, `2.5e-07`).
fn format_real(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{:e}", f);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if f != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = f.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

fn quote_text(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::build_subscriber;
    use crate::logging::tests::SharedBuffer;
    use crate::store::SqliteStore;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tracing_subscriber::EnvFilter;
    use tempfile::NamedTempFile;

    fn run_shell(store: &mut SqliteStore, script: &str) -> String {
        let mut output = Vec::new();
        let config = AssistantConfig::default();
        InteractiveShell::new(store, Cursor::new(script.to_string()), &mut output, &config)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    fn cars_csv() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "make,year,price\nFord,2010,12.5\nKia,2018,9000.0\n").unwrap();
        file
    }

    #[test]
    fn test_format_row() {
        let row = vec![
            CellValue::Integer(1),
            CellValue::Text("Ford".into()),
            CellValue::Real(12.0),
            CellValue::Null,
        ];
        assert_eq!(format_row(&row), "(1, 'Ford', 12.0, None)");
        assert_eq!(format_row(&[CellValue::Integer(7)]), "(7,)");
        assert_eq!(format_row(&[CellValue::Text("it's".into())]), "(\"it's\",)");
        assert_eq!(format_row(&[CellValue::Blob(vec![0x61, 0x00])]), "(b'a\\x00',)");
    }

    #[test]
    fn test_real_formatting() {
        assert_eq!(format_real(12.5), "12.5");
        assert_eq!(format_real(-0.0), "-0.0");
        assert_eq!(format_real(1e15), "1000000000000000.0");
        assert_eq!(format_real(1e16), "1e+16");
        assert_eq!(format_real(1.2345678901234569e23), "1.2345678901234569e+23");
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(1e-7), "1e-07");
        assert_eq!(format_real(2.5e-123), "2.5e-123");
        assert_eq!(format_real(f64::NAN), "nan");
        assert_eq!(format_real(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_row(&[CellValue::Real(1e16)]), "(1e+16,)");
    }

    #[test]
    fn test_menu_parse() {
        assert_eq!(MenuAction::parse(" 2 "), Some(MenuAction::Query));
        assert_eq!(MenuAction::parse("5"), None);
    }

    #[test]
    fn test_load_then_query_then_list() {
        let csv = cars_csv();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let script = format!(
            "1\n{}\ncars\n2\nSELECT id, make FROM cars ORDER BY id\n3\n4\n",
            csv.path().display()
        );

        let output = run_shell(&mut store, &script);

        assert!(output.starts_with(WELCOME));
        assert!(output.contains("Created table 'cars' with 2 rows"));
        assert!(output.contains("(1, 'Ford')\n(2, 'Kia')\n"));
        assert!(output.contains("Tables in database:\n * cars\n"));
        assert_eq!(store.row_count("cars").unwrap(), 2);
    }

    #[test]
    fn test_mismatch_rename_prompt() {
        let csv = cars_csv();
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE cars (id INTEGER PRIMARY KEY AUTOINCREMENT, make TEXT)")
            .unwrap();
        let script = format!("1\n{}\ncars\n2\ncars_v2\n4\n", csv.path().display());

        let output = run_shell(&mut store, &script);

        assert!(output.contains(MISMATCH_HELP));
        assert!(output.contains("  existing: make\n  incoming: make, year, price\n"));
        assert!(output.contains("Creating new table..."));
        assert_eq!(store.row_count("cars").unwrap(), 0);
        assert_eq!(store.row_count("cars_v2").unwrap(), 2);
    }

    #[test]
    fn test_unrecognised_mismatch_choice_skips() {
        let csv = cars_csv();
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE cars (id INTEGER PRIMARY KEY AUTOINCREMENT, make TEXT)")
            .unwrap();
        let script = format!("1\n{}\ncars\nmaybe\n4\n", csv.path().display());

        let output = run_shell(&mut store, &script);

        assert!(output.contains("Skipping..."));
        assert!(output.contains("Skipped; 'cars' left unchanged"));
        assert_eq!(store.table_names().unwrap(), vec!["cars".to_string()]);
    }

    #[test]
    fn test_errors_are_reported_generically_and_loop_continues() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let script = "2\nSELECT * FROM missing\n1\n/no/such/file.csv\ncars\n9\n3\n4\n";

        let output = run_shell(&mut store, script);

        let generic = "An error has occurred, check error_log.txt for details.";
        assert_eq!(output.matches(generic).count(), 3);
        assert!(!output.contains("no such table"));
        assert!(output.contains("Tables in database:"));
    }

    #[test]
    fn test_failure_detail_goes_to_error_log_only() {
        let log = NamedTempFile::new().unwrap();
        let console = SharedBuffer::default();
        let c = console.clone();
        let subscriber = build_subscriber(
            move || c.clone(),
            Mutex::new(log.reopen().unwrap()),
            EnvFilter::new("warn"),
        )
        .unwrap();
        let mut store = SqliteStore::open_in_memory().unwrap();

        let output = tracing::subscriber::with_default(subscriber, || {
            run_shell(&mut store, "2\nSELECT * FROM missing_table\n4\n")
        });

        let logged = std::fs::read_to_string(log.path()).unwrap();
        assert!(logged.contains("ERROR"));
        assert!(logged.contains("SELECT * FROM missing_table"));
        assert!(logged.contains("Caused by"));
        assert!(logged.contains("no such table: missing_table"));
        assert!(!console.contents().contains("missing_table"));
        assert!(!output.contains("missing_table"));
        assert!(output.contains("An error has occurred, check error_log.txt for details."));
    }

    #[test]
    fn test_end_of_input_leaves_loop() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let output = run_shell(&mut store, "3\n");

        assert!(output.contains("Tables in database:"));
    }
}

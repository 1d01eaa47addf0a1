use sql_assistant::config::{AssistantConfig, ConfigOverrides};
use sql_assistant::logging::init_logging;
use sql_assistant::shell::format_row;
use sql_assistant::{
    CsvSource, DatasetSource, FixedResolution, InteractiveShell, MismatchChoice,
    ReconciliationController, RelationalStore, Resolution, SqliteStore,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "sql-assistant")]
#[command(about = "Load CSV files into SQLite and query them")]
#[command(version)]
struct Args {
    /// SQLite database file (or set SQL_ASSISTANT_DB)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// File that receives error details (or set SQL_ASSISTANT_ERROR_LOG)
    #[arg(long, global = true)]
    error_log: Option<PathBuf>,

    /// Also require column types to match existing tables
    #[arg(long, global = true)]
    strict_schema: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Shell,
    /// Load a CSV file without prompting
    Load {
        /// CSV file to load
        #[arg(long)]
        csv: PathBuf,

        /// Target table
        #[arg(long)]
        table: String,

        /// What to do if the table exists with a different schema
        #[arg(long, default_value = "skip", value_parser = parse_mismatch_choice)]
        on_mismatch: MismatchChoice,

        /// Table to load into when --on-mismatch=rename
        #[arg(long)]
        rename_to: Option<String>,
    },
    /// Run one SQL statement and print the rows
    Query {
        sql: String,
    },
    /// List tables in the database
    Tables,
    /// Print a table's stored schema as JSON
    Schema {
        table: String,
    },
}

fn parse_mismatch_choice(s: &str) -> std::result::Result<MismatchChoice, String> {
    MismatchChoice::parse(s).ok_or_else(|| format!("expected overwrite, rename or skip, got '{}'", s))
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = AssistantConfig::from_env(ConfigOverrides {
        database: args.database,
        error_log: args.error_log,
        strict_schema: args.strict_schema,
        verbose: args.verbose,
    });

    init_logging(&config.error_log, config.verbose)?;
    info!("Using database {}", config.database.display());

    let mut store = SqliteStore::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;

    let result = match args.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(&mut store, &config),
        Commands::Load {
            csv,
            table,
            on_mismatch,
            rename_to,
        } => load(&mut store, &config, csv, &table, on_mismatch, rename_to),
        Commands::Query { sql } => query(&mut store, &sql),
        Commands::Tables => tables(&store),
        Commands::Schema { table } => schema(&store, &table),
    };

    store.close()?;
    result
}

fn run_shell(store: &mut SqliteStore, config: &AssistantConfig) -> Result<()> {
    let stdin = io::stdin();
    InteractiveShell::new(store, stdin.lock(), io::stdout(), config).run()?;
    Ok(())
}

fn load(
    store: &mut SqliteStore,
    config: &AssistantConfig,
    csv: PathBuf,
    table: &str,
    on_mismatch: MismatchChoice,
    rename_to: Option<String>,
) -> Result<()> {
    let resolution = match (on_mismatch, rename_to) {
        (MismatchChoice::Overwrite, _) => Resolution::Overwrite,
        (MismatchChoice::Skip, _) => Resolution::Skip,
        (MismatchChoice::Rename, Some(name)) => Resolution::Rename(name),
        (MismatchChoice::Rename, None) => bail!("--on-mismatch=rename requires --rename-to"),
    };

    let source = CsvSource::new(csv);
    info!("Loading {} source {}", source.source_type(), source.source_uri());
    let dataset = source.load()?;

    let outcome = ReconciliationController::new(store, config.comparison).reconcile(
        &dataset,
        table,
        &mut FixedResolution(resolution),
    )?;
    println!("{}", outcome);
    Ok(())
}

fn query(store: &mut SqliteStore, sql: &str) -> Result<()> {
    let result = store.query(sql)?;
    for row in &result.rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn tables(store: &SqliteStore) -> Result<()> {
    println!("Tables in database:");
    for table in store.table_names()? {
        println!(" * {}", table);
    }
    Ok(())
}

fn schema(store: &SqliteStore, table: &str) -> Result<()> {
    let schema = store.table_schema(table)?;
    if schema.is_empty() {
        bail!("Table '{}' does not exist", table);
    }
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

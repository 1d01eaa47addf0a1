//! SQL Assistant
//!
//! Imports CSV files into SQLite tables, reconciling against any existing
//! table of the same name, and offers a small query shell on top.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod materialize;
pub mod reconcile;
pub mod schema;
pub mod shell;
pub mod store;

pub use config::{AssistantConfig, ConfigOverrides};
pub use error::{AssistantError, Result};
pub use ingestion::{CellValue, CsvSource, Dataset, DatasetSource, SourceType};
pub use materialize::TableMaterializer;
pub use reconcile::{
    FixedResolution, MismatchChoice, ReconcileOutcome, ReconciliationController, Resolution,
    ResolutionPrompt,
};
pub use schema::{schemas_match, ColumnSchema, ColumnType, ComparisonMode, TableSchema};
pub use shell::InteractiveShell;
pub use store::{RelationalStore, SqliteStore};

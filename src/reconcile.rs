//! Reconciliation Controller
//!
//! Decides what a load does when the requested table may already exist:
//!
//! - absent table: create it and insert
//! - matching schema: append
//! - mismatched schema: ask the caller to overwrite, rename or skip
//!
//! Overwrite drops the existing table without further confirmation. Skip
//! never touches the store.

use crate::error::{AssistantError, Result};
use crate::ingestion::Dataset;
use crate::materialize::TableMaterializer;
use crate::schema::{schemas_match, ColumnSchema, ComparisonMode, TableSchema};
use crate::store::{quote_ident, RelationalStore};
use std::fmt;
use tracing::{info, warn};

/// Answer to the overwrite / rename / skip question
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MismatchChoice {
    Overwrite,
    Rename,
    Skip,
}

impl MismatchChoice {
    /// Accepts `1`/`o`/`overwrite`, `2`/`r`/`rename`, `3`/`s`/`skip` in any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "o" | "overwrite" => Some(MismatchChoice::Overwrite),
            "2" | "r" | "rename" => Some(MismatchChoice::Rename),
            "3" | "s" | "skip" => Some(MismatchChoice::Skip),
            _ => None,
        }
    }

    /// Like [`MismatchChoice::parse`], but anything unrecognised means Skip.
    pub fn parse_or_skip(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|| {
            warn!("Unrecognised choice '{}', skipping", input.trim());
            MismatchChoice::Skip
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Overwrite,
    Rename(String),
    Skip,
}

/// Supplies a [`Resolution`] when the existing table does not match.
pub trait ResolutionPrompt {
    fn resolve(
        &mut self,
        table: &str,
        existing: &TableSchema,
        incoming: &ColumnSchema,
    ) -> Result<Resolution>;
}

/// Always answers with the same resolution; used for non-interactive loads.
pub struct FixedResolution(pub Resolution);

impl ResolutionPrompt for FixedResolution {
    fn resolve(
        &mut self,
        _table: &str,
        _existing: &TableSchema,
        _incoming: &ColumnSchema,
    ) -> Result<Resolution> {
        Ok(self.0.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created { table: String, rows: usize },
    Appended { table: String, rows: usize },
    Overwritten { table: String, rows: usize },
    Renamed { from: String, to: String, rows: usize },
    Skipped { table: String },
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Created { table, rows } => {
                write!(f, "Created table '{}' with {} rows", table, rows)
            }
            ReconcileOutcome::Appended { table, rows } => {
                write!(f, "Schemas are the same, appended {} rows to '{}'", rows, table)
            }
            ReconcileOutcome::Overwritten { table, rows } => {
                write!(f, "Overwrote table '{}' with {} rows", table, rows)
            }
            ReconcileOutcome::Renamed { from, to, rows } => {
                write!(f, "Loaded {} rows into '{}'; '{}' left unchanged", rows, to, from)
            }
            ReconcileOutcome::Skipped { table } => {
                write!(f, "Skipped; '{}' left unchanged", table)
            }
        }
    }
}

pub struct ReconciliationController<'a, S: RelationalStore> {
    store: &'a mut S,
    materializer: TableMaterializer,
    mode: ComparisonMode,
}

impl<'a, S: RelationalStore> ReconciliationController<'a, S> {
    pub fn new(store: &'a mut S, mode: ComparisonMode) -> Self {
        Self {
            store,
            materializer: TableMaterializer::new(),
            mode,
        }
    }

    /// Load `dataset` into `table`, asking `prompt` only on a schema mismatch.
    pub fn reconcile<P: ResolutionPrompt + ?Sized>(
        &mut self,
        dataset: &Dataset,
        table: &str,
        prompt: &mut P,
    ) -> Result<ReconcileOutcome> {
        let incoming = ColumnSchema::from_dataset(dataset)?;
        let existing = self.store.table_schema(table)?;

        if existing.is_empty() {
            info!("Table '{}' does not exist, creating it", table);
            let rows = self.materialize(dataset, table)?;
            return Ok(ReconcileOutcome::Created {
                table: table.to_string(),
                rows,
            });
        }

        if schemas_match(&existing, &incoming, self.mode) {
            info!("Schemas are the same, appending to '{}'", table);
            let rows = self.materialize(dataset, table)?;
            return Ok(ReconcileOutcome::Appended {
                table: table.to_string(),
                rows,
            });
        }

        info!(
            "Schema mismatch for '{}' ({} mode): stored {:?}, incoming {:?}",
            table,
            self.mode,
            existing.data_column_names(),
            incoming.names()
        );

        match prompt.resolve(table, &existing, &incoming)? {
            Resolution::Overwrite => {
                warn!("Overwriting table '{}'", table);
                self.store
                    .execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
                let rows = self.materialize(dataset, table)?;
                Ok(ReconcileOutcome::Overwritten {
                    table: table.to_string(),
                    rows,
                })
            }
            Resolution::Rename(new_name) => self.rename(dataset, &incoming, table, &new_name),
            Resolution::Skip => {
                info!("Skipping load into '{}'", table);
                Ok(ReconcileOutcome::Skipped {
                    table: table.to_string(),
                })
            }
        }
    }

    /// Load into `new_name`, leaving `table` untouched. A target that already
    /// exists must be compatible; otherwise nothing is written.
    fn rename(
        &mut self,
        dataset: &Dataset,
        incoming: &ColumnSchema,
        table: &str,
        new_name: &str,
    ) -> Result<ReconcileOutcome> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AssistantError::UserInputInvalid(
                "a new table name is required".to_string(),
            ));
        }

        let target = self.store.table_schema(new_name)?;
        if !target.is_empty() && !schemas_match(&target, incoming, self.mode) {
            return Err(AssistantError::SchemaConflict {
                table: new_name.to_string(),
            });
        }

        info!("Loading into '{}' instead of '{}'", new_name, table);
        let rows = self.materialize(dataset, new_name)?;
        Ok(ReconcileOutcome::Renamed {
            from: table.to_string(),
            to: new_name.to_string(),
            rows,
        })
    }

    fn materialize(&mut self, dataset: &Dataset, table: &str) -> Result<usize> {
        self.materializer
            .materialize(&mut *self.store, dataset, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{CellValue, SourceColumn, SourceType};
    use crate::store::SqliteStore;

    fn dataset(names: &[&str], rows: usize) -> Dataset {
        let columns = names
            .iter()
            .map(|n| SourceColumn::new(*n, SourceType::Int64))
            .collect();
        let rows = (0..rows)
            .map(|r| names.iter().map(|_| CellValue::Integer(r as i64)).collect())
            .collect();
        Dataset::new(columns, rows)
    }

    /// Fails the test if the controller asks for a resolution.
    struct NeverAsked;

    impl ResolutionPrompt for NeverAsked {
        fn resolve(&mut self, table: &str, _: &TableSchema, _: &ColumnSchema) -> Result<Resolution> {
            panic!("unexpected prompt for '{}'", table);
        }
    }

    fn seeded(names: &[&str], rows: usize) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        TableMaterializer::new()
            .materialize(&mut store, &dataset(names, rows), "t")
            .unwrap();
        store
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(MismatchChoice::parse("1"), Some(MismatchChoice::Overwrite));
        assert_eq!(MismatchChoice::parse(" R "), Some(MismatchChoice::Rename));
        assert_eq!(MismatchChoice::parse("Skip"), Some(MismatchChoice::Skip));
        assert_eq!(MismatchChoice::parse("4"), None);
        assert_eq!(MismatchChoice::parse_or_skip("whatever"), MismatchChoice::Skip);
    }

    #[test]
    fn test_absent_table_is_created() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(&dataset(&["a", "b"], 3), "t", &mut NeverAsked)
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Created {
                table: "t".into(),
                rows: 3
            }
        );
    }

    #[test]
    fn test_matching_table_is_appended() {
        let mut store = seeded(&["a", "b"], 2);
        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(&dataset(&["a", "b"], 3), "t", &mut NeverAsked)
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Appended { rows: 3, .. }));
        assert_eq!(store.row_count("t").unwrap(), 5);
    }

    #[test]
    fn test_overwrite_replaces_table() {
        let mut store = seeded(&["a"], 4);
        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(
                &dataset(&["x", "y"], 2),
                "t",
                &mut FixedResolution(Resolution::Overwrite),
            )
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Overwritten { rows: 2, .. }));
        assert_eq!(store.row_count("t").unwrap(), 2);
        assert_eq!(
            store.table_schema("t").unwrap().data_column_names(),
            vec!["x", "y"]
        );
    }

    #[test]
    fn test_skip_leaves_store_alone() {
        let mut store = seeded(&["a"], 4);
        let before = store.table_schema("t").unwrap();

        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(&dataset(&["x"], 2), "t", &mut FixedResolution(Resolution::Skip))
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped { table: "t".into() });
        assert_eq!(store.table_schema("t").unwrap(), before);
        assert_eq!(store.row_count("t").unwrap(), 4);
        assert_eq!(store.table_names().unwrap(), vec!["t".to_string()]);
    }

    #[test]
    fn test_rename_creates_new_table() {
        let mut store = seeded(&["a"], 4);
        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(
                &dataset(&["x"], 2),
                "t",
                &mut FixedResolution(Resolution::Rename(" t2 ".into())),
            )
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Renamed {
                from: "t".into(),
                to: "t2".into(),
                rows: 2
            }
        );
        assert_eq!(store.row_count("t").unwrap(), 4);
        assert_eq!(store.row_count("t2").unwrap(), 2);
    }

    #[test]
    fn test_rename_requires_name() {
        let mut store = seeded(&["a"], 1);
        let err = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(
                &dataset(&["x"], 1),
                "t",
                &mut FixedResolution(Resolution::Rename("   ".into())),
            )
            .unwrap_err();

        assert!(matches!(err, AssistantError::UserInputInvalid(_)));
    }

    #[test]
    fn test_rename_into_conflicting_table_writes_nothing() {
        let mut store = seeded(&["a"], 1);
        TableMaterializer::new()
            .materialize(&mut store, &dataset(&["q"], 1), "other")
            .unwrap();

        let err = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(
                &dataset(&["x"], 1),
                "t",
                &mut FixedResolution(Resolution::Rename("other".into())),
            )
            .unwrap_err();

        assert!(matches!(err, AssistantError::SchemaConflict { .. }));
        assert_eq!(store.row_count("other").unwrap(), 1);
    }

    #[test]
    fn test_strict_mode_prompts_on_type_change() {
        let mut store = seeded(&["a"], 1);
        let text = Dataset::new(
            vec![SourceColumn::new("a", SourceType::Text)],
            vec![vec![CellValue::Text("x".into())]],
        );

        let outcome = ReconciliationController::new(&mut store, ComparisonMode::Strict)
            .reconcile(&text, "t", &mut FixedResolution(Resolution::Skip))
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Skipped { .. }));

        let outcome = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(&text, "t", &mut NeverAsked)
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Appended { rows: 1, .. }));
    }

    #[test]
    fn test_unsupported_type_fails_before_prompt() {
        let mut store = seeded(&["a"], 1);
        let flags = Dataset::new(
            vec![SourceColumn::new("flag", SourceType::Boolean)],
            vec![vec![CellValue::Integer(1)]],
        );

        let err = ReconciliationController::new(&mut store, ComparisonMode::NameOnly)
            .reconcile(&flags, "t", &mut NeverAsked)
            .unwrap_err();
        assert!(matches!(err, AssistantError::UnsupportedType { .. }));
    }
}

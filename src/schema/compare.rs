//! Schema Comparator - existing table vs incoming dataset

use crate::schema::table::TableSchema;
use crate::schema::types::ColumnSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How strictly an existing table must agree with a dataset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonMode {
    /// Same column names in the same order; declared types are ignored
    #[default]
    NameOnly,
    /// Names, order and declared types must all agree
    Strict,
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::NameOnly => f.write_str("name-only"),
            ComparisonMode::Strict => f.write_str("strict"),
        }
    }
}

/// Positional comparison of `table_schema` (identity column stripped) with
/// `dataset_schema`. Callers handle an absent table before calling this.
pub fn schemas_match(
    table_schema: &TableSchema,
    dataset_schema: &ColumnSchema,
    mode: ComparisonMode,
) -> bool {
    let stored = table_schema.data_columns();
    if stored.len() != dataset_schema.len() {
        return false;
    }

    stored
        .iter()
        .zip(&dataset_schema.columns)
        .all(|(existing, incoming)| {
            existing.name == incoming.name
                && match mode {
                    ComparisonMode::NameOnly => true,
                    ComparisonMode::Strict => existing
                        .declared_type
                        .eq_ignore_ascii_case(incoming.column_type.sql_name()),
                }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::table::StoredColumn;
    use crate::schema::types::{ColumnDef, ColumnType};

    fn stored(columns: &[(&str, &str)]) -> TableSchema {
        TableSchema::new(
            columns
                .iter()
                .enumerate()
                .map(|(idx, (name, ty))| StoredColumn {
                    position: idx as i64,
                    name: name.to_string(),
                    declared_type: ty.to_string(),
                    not_null: idx == 0,
                    primary_key: idx == 0,
                })
                .collect(),
        )
    }

    fn incoming(columns: &[(&str, ColumnType)]) -> ColumnSchema {
        ColumnSchema {
            columns: columns
                .iter()
                .map(|(name, ty)| ColumnDef {
                    name: name.to_string(),
                    column_type: *ty,
                })
                .collect(),
        }
    }

    fn cars() -> ColumnSchema {
        incoming(&[
            ("make", ColumnType::Text),
            ("year", ColumnType::Integer),
            ("price", ColumnType::Float),
        ])
    }

    #[test]
    fn test_matching_names_match() {
        let table = stored(&[
            ("id", "INTEGER"),
            ("make", "TEXT"),
            ("year", "INTEGER"),
            ("price", "REAL"),
        ]);
        assert!(schemas_match(&table, &cars(), ComparisonMode::NameOnly));
        assert!(schemas_match(&table, &cars(), ComparisonMode::Strict));
    }

    #[test]
    fn test_missing_column_is_mismatch() {
        let table = stored(&[("id", "INTEGER"), ("make", "TEXT"), ("year", "INTEGER")]);
        assert!(!schemas_match(&table, &cars(), ComparisonMode::NameOnly));
    }

    #[test]
    fn test_order_matters() {
        let table = stored(&[
            ("id", "INTEGER"),
            ("year", "INTEGER"),
            ("make", "TEXT"),
            ("price", "REAL"),
        ]);
        assert!(!schemas_match(&table, &cars(), ComparisonMode::NameOnly));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let table = stored(&[
            ("id", "INTEGER"),
            ("Make", "TEXT"),
            ("year", "INTEGER"),
            ("price", "REAL"),
        ]);
        assert!(!schemas_match(&table, &cars(), ComparisonMode::NameOnly));
    }

    #[test]
    fn test_type_difference_only_fails_strict() {
        let table = stored(&[
            ("id", "INTEGER"),
            ("make", "TEXT"),
            ("year", "TEXT"),
            ("price", "real"),
        ]);
        assert!(schemas_match(&table, &cars(), ComparisonMode::NameOnly));
        assert!(!schemas_match(&table, &cars(), ComparisonMode::Strict));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ComparisonMode::default().to_string(), "name-only");
        assert_eq!(ComparisonMode::Strict.to_string(), "strict");
    }
}

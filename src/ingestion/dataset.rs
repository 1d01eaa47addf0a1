//! Dataset - In-memory rows read from a source file

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred type tag of a source column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Int64,
    Float64,
    Boolean,
    Text,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SourceType::Int64 => "int64",
            SourceType::Float64 => "float64",
            SourceType::Boolean => "bool",
            SourceType::Text => "text",
        };
        f.write_str(tag)
    }
}

/// A single cell, either read from a source or returned by a query
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub name: String,
    pub source_type: SourceType,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
        }
    }
}

/// Ordered rows plus the inferred shape of each column.
///
/// Immutable once built; every row has exactly one cell per column.
#[derive(Clone, Debug)]
pub struct Dataset {
    columns: Vec<SourceColumn>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<SourceColumn>, rows: Vec<Vec<CellValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

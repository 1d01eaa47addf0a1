//! Type Mapper - source type tags to store column types

use crate::error::{AssistantError, Result};
use crate::ingestion::{Dataset, SourceType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type in the target store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Declared SQL type used in generated DDL
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Map an inferred source tag to a column type.
///
/// Only integer, float and text tags have a mapping; anything else is
/// surfaced as `UnsupportedType` rather than coerced.
pub fn map_type(column: &str, tag: SourceType) -> Result<ColumnType> {
    match tag {
        SourceType::Int64 => Ok(ColumnType::Integer),
        SourceType::Float64 => Ok(ColumnType::Float),
        SourceType::Text => Ok(ColumnType::Text),
        other => Err(AssistantError::UnsupportedType {
            column: column.to_string(),
            tag: other.to_string(),
        }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered shape of an incoming dataset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    /// Maps every dataset column, failing on the first unsupported tag.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let columns = dataset
            .columns()
            .iter()
            .map(|c| {
                Ok(ColumnDef {
                    name: c.name.clone(),
                    column_type: map_type(&c.name, c.source_type)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

//! Stored table schema as reported by introspection

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredColumn {
    pub position: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Columns of an existing table in declared order.
///
/// The first column is the identity column added at creation time. An
/// empty schema means the table does not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<StoredColumn>,
}

impl TableSchema {
    pub fn new(columns: Vec<StoredColumn>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns after the leading identity column
    pub fn data_columns(&self) -> &[StoredColumn] {
        self.columns.get(1..).unwrap_or(&[])
    }

    pub fn data_column_names(&self) -> Vec<&str> {
        self.data_columns().iter().map(|c| c.name.as_str()).collect()
    }
}

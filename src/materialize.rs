//! Table Materializer - creates a table for a dataset and appends its rows
//!
//! Every created table gets a leading identity column followed by one column
//! per dataset field. Creation is `CREATE TABLE IF NOT EXISTS`, so calling this
//! against a table with the same layout only appends. Against a different
//! layout the create is a no-op and the append fails with `InsertFailed`.
//! The DDL and the append are separate transactions.

use crate::error::Result;
use crate::ingestion::Dataset;
use crate::schema::ColumnSchema;
use crate::store::{quote_ident, RelationalStore};
use tracing::info;

pub const IDENTITY_COLUMN: &str = "id";

#[derive(Clone, Copy, Debug, Default)]
pub struct TableMaterializer;

impl TableMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// Build the create-if-absent statement for `table`.
    pub fn create_statement(&self, table: &str, schema: &ColumnSchema) -> String {
        let mut columns = Vec::with_capacity(schema.len() + 1);
        columns.push(format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL UNIQUE",
            quote_ident(IDENTITY_COLUMN)
        ));
        for column in &schema.columns {
            columns.push(format!(
                "{} {}",
                quote_ident(&column.name),
                column.column_type.sql_name()
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);",
            quote_ident(table),
            columns.join(",\n  ")
        )
    }

    /// Create `table` if needed and append every row of `dataset` in order.
    /// Returns the number of rows appended.
    pub fn materialize<S: RelationalStore>(
        &self,
        store: &mut S,
        dataset: &Dataset,
        table: &str,
    ) -> Result<usize> {
        let schema = ColumnSchema::from_dataset(dataset)?;
        let ddl = self.create_statement(table, &schema);

        store
            .execute(&ddl)
            .map_err(|e| e.into_insert_failed(table))?;

        let appended = store.append_rows(table, &schema.names(), dataset.rows())?;
        info!("Appended {} rows to '{}'", appended, table);

        Ok(appended)
    }
}

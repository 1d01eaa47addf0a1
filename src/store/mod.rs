//! Store Module
//!
//! The relational store is an external collaborator. The core only needs
//! introspection, statement execution, bulk append and free-form queries.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::ingestion::CellValue;
use crate::schema::TableSchema;

/// Rows returned by a free-form query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

pub trait RelationalStore {
    /// Columns of `table` in declared order; empty when the table is absent.
    fn table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Run a statement that returns no rows, committing immediately.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Append `rows` to `table`, naming `columns` explicitly. Returns the
    /// number of rows written.
    fn append_rows(&mut self, table: &str, columns: &[&str], rows: &[Vec<CellValue>])
        -> Result<usize>;

    /// Run arbitrary SQL and collect whatever rows it returns.
    fn query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Names of user tables
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("cars"), "\"cars\"");
        assert_eq!(quote_ident("my \"odd\" name"), "\"my \"\"odd\"\" name\"");
    }
}

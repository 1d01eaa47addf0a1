//! SQLite Store - rusqlite-backed implementation of [`RelationalStore`]
//!
//! One connection is owned for the whole session and closed on drop or via
//! [`SqliteStore::close`].

use crate::error::{AssistantError, Result};
use crate::ingestion::CellValue;
use crate::schema::{StoredColumn, TableSchema};
use crate::store::{quote_ident, QueryResult, RelationalStore};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::path::Path;
use tracing::{debug, info};

pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(AssistantError::StoreUnavailable)?;
        info!("Opened database {}", path.display());

        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AssistantError::StoreUnavailable)?;
        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| AssistantError::Statement { sql, source })
    }

    /// Close the connection, surfacing any error instead of dropping it.
    pub fn close(self) -> Result<()> {
        let location = self.location;
        self.conn
            .close()
            .map_err(|(_, e)| AssistantError::StoreUnavailable(e))?;
        info!("Closed database {}", location);
        Ok(())
    }
}

impl RelationalStore for SqliteStore {
    fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT cid, name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#,
            )
            .map_err(AssistantError::StoreUnavailable)?;

        let columns = stmt
            .query_map(params![table], |row| {
                Ok(StoredColumn {
                    position: row.get(0)?,
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    primary_key: row.get::<_, i64>(4)? != 0,
                })
            })
            .map_err(AssistantError::StoreUnavailable)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(AssistantError::StoreUnavailable)?;

        Ok(TableSchema::new(columns))
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        self.conn
            .execute_batch(sql)
            .map_err(|source| AssistantError::Statement {
                sql: sql.to_string(),
                source,
            })
    }

    fn append_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<CellValue>],
    ) -> Result<usize> {
        let insert_failed = |source: rusqlite::Error| AssistantError::InsertFailed {
            table: table.to_string(),
            source,
        };

        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list,
            placeholders
        );
        debug!("Appending {} rows: {}", rows.len(), insert);

        let tx = self
            .conn
            .transaction()
            .map_err(AssistantError::StoreUnavailable)?;
        {
            let mut stmt = tx.prepare(&insert).map_err(insert_failed)?;
            for row in rows {
                stmt.execute(params_from_iter(row.iter()))
                    .map_err(insert_failed)?;
            }
        }
        tx.commit().map_err(insert_failed)?;

        Ok(rows.len())
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let statement_failed = |source: rusqlite::Error| AssistantError::Statement {
            sql: sql.to_string(),
            source,
        };

        let mut stmt = self.conn.prepare(sql).map_err(statement_failed)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut result_rows = stmt.query([]).map_err(statement_failed)?;
        let mut rows = Vec::new();
        while let Some(row) = result_rows.next().map_err(statement_failed)? {
            let cells = (0..width)
                .map(|idx| row.get_ref(idx).map(CellValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(statement_failed)?;
            rows.push(cells);
        }

        Ok(QueryResult { columns, rows })
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .map_err(AssistantError::StoreUnavailable)?;

        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(AssistantError::StoreUnavailable)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(AssistantError::StoreUnavailable)?;

        Ok(names)
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            CellValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
        })
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Read error for {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Unsupported type '{tag}' for column '{column}'")]
    UnsupportedType { column: String, tag: String },

    #[error("Store unavailable")]
    StoreUnavailable(#[source] rusqlite::Error),

    #[error("Insert into '{table}' failed")]
    InsertFailed {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Statement failed: {sql}")]
    Statement {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid input: {0}")]
    UserInputInvalid(String),

    #[error("Table '{table}' already exists with a different schema")]
    SchemaConflict { table: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssistantError {
    /// Re-labels a failed statement as an insert failure against `table`.
    pub fn into_insert_failed(self, table: &str) -> Self {
        match self {
            AssistantError::Statement { source, .. } => AssistantError::InsertFailed {
                table: table.to_string(),
                source,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;

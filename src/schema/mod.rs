//! Schema Module
//!
//! Type mapping, stored table schemas and the compatibility check between them.

pub mod compare;
pub mod table;
pub mod types;

pub use compare::{schemas_match, ComparisonMode};
pub use table::{StoredColumn, TableSchema};
pub use types::{map_type, ColumnDef, ColumnSchema, ColumnType};

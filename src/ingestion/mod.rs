//! Ingestion Module
//!
//! Reads source files into in-memory datasets with one inferred type per column.

pub mod csv_source;
pub mod dataset;
pub mod source;

pub use csv_source::CsvSource;
pub use dataset::{CellValue, Dataset, SourceColumn, SourceType};
pub use source::DatasetSource;

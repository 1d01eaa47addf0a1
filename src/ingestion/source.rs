//! Dataset Source Trait - Abstract interface for input files

use crate::error::Result;
use crate::ingestion::dataset::Dataset;

/// Produces a [`Dataset`] with one inferred type per column.
///
/// Implementations:
/// - CsvSource: delimited text files
pub trait DatasetSource {
    /// Read the whole source into memory
    fn load(&self) -> Result<Dataset>;

    /// Get source type (e.g., "csv")
    fn source_type(&self) -> &str;

    /// Get source location, used in log lines
    fn source_uri(&self) -> String;
}

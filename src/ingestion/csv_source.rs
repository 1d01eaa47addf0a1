//! CSV Source - Reads a delimited file and infers per-column types

use crate::error::{AssistantError, Result};
use crate::ingestion::dataset::{CellValue, Dataset, SourceColumn, SourceType};
use crate::ingestion::source::DatasetSource;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Cell contents treated as missing values.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "<NA>", "#N/A",
];

/// CSV Source - first record is the header, remaining records are rows.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_error(&self, reason: impl Into<String>) -> AssistantError {
        AssistantError::Read {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn read_raw(&self) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e.to_string()))?;

        let headers = rdr
            .headers()
            .map_err(|e| self.read_error(format!("failed to read header: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(self.read_error("no columns to parse from file"));
        }

        let names = normalize_headers(&headers);
        let width = names.len();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.read_error(e.to_string()))?;
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(self.read_error(format!(
                    "line {}: expected {} fields, saw {}",
                    line,
                    width,
                    record.len()
                )));
            }

            let row = (0..width)
                .map(|idx| record.get(idx).filter(|c| !is_missing(c)).map(str::to_string))
                .collect();
            rows.push(row);
        }

        Ok((names, rows))
    }
}

impl DatasetSource for CsvSource {
    fn load(&self) -> Result<Dataset> {
        let (names, raw_rows) = self.read_raw()?;

        let columns: Vec<SourceColumn> = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<Option<&str>> = raw_rows.iter().map(|r| r[idx].as_deref()).collect();
                SourceColumn::new(name, infer_column(&cells))
            })
            .collect();

        for column in &columns {
            debug!("Inferred {} for column '{}'", column.source_type, column.name);
        }

        let rows = raw_rows
            .into_iter()
            .map(|raw| {
                raw.into_iter()
                    .zip(&columns)
                    .map(|(cell, column)| coerce_cell(cell, column.source_type))
                    .collect()
            })
            .collect::<Vec<Vec<CellValue>>>();

        info!(
            "Read {} rows x {} columns from {}",
            rows.len(),
            columns.len(),
            self.path.display()
        );

        Ok(Dataset::new(columns, rows))
    }

    fn source_type(&self) -> &str {
        "csv"
    }

    fn source_uri(&self) -> String {
        self.path.display().to_string()
    }
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn is_integer_literal(cell: &str) -> bool {
    let digits = cell.strip_prefix(['+', '-']).unwrap_or(cell);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Blank headers become `Unnamed: {idx}`; repeats get a `.{n}` suffix.
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();

    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let base = if raw.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                raw.to_string()
            };

            let mut name = base.clone();
            let mut n = 0;
            while used.contains(&name) {
                n += 1;
                name = format!("{}.{}", base, n);
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

fn infer_column(cells: &[Option<&str>]) -> SourceType {
    if cells.is_empty() {
        return SourceType::Text;
    }

    let present: Vec<&str> = cells.iter().flatten().map(|c| c.trim()).collect();
    let has_missing = present.len() < cells.len();

    // Missing values cannot be held by an integer column.
    if present.is_empty() {
        return SourceType::Float64;
    }
    if present.iter().all(|c| c.parse::<i64>().is_ok()) {
        return if has_missing {
            SourceType::Float64
        } else {
            SourceType::Int64
        };
    }
    // Integers outside the i64 range would lose precision as floats.
    if present.iter().all(|c| is_integer_literal(c)) {
        return SourceType::Text;
    }
    if present.iter().all(|c| c.parse::<f64>().is_ok()) {
        return SourceType::Float64;
    }
    if !has_missing && present.iter().all(|c| parse_bool(c).is_some()) {
        return SourceType::Boolean;
    }

    SourceType::Text
}

fn coerce_cell(cell: Option<String>, source_type: SourceType) -> CellValue {
    let Some(cell) = cell else {
        return CellValue::Null;
    };
    let trimmed = cell.trim();

    match source_type {
        SourceType::Int64 => trimmed
            .parse::<i64>()
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Text(cell)),
        SourceType::Float64 => trimmed
            .parse::<f64>()
            .map(CellValue::Real)
            .unwrap_or(CellValue::Text(cell)),
        SourceType::Boolean => match parse_bool(trimmed) {
            Some(b) => CellValue::Integer(b as i64),
            None => CellValue::Text(cell),
        },
        SourceType::Text => CellValue::Text(cell),
    }
}

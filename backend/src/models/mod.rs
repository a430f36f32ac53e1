//! Domain models for the Data Sweeper pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Dataset`] - Named columns of equal length, produced by ingest
//! - [`Column`] - One named, typed column
//! - [`Cell`] - A single value (integer, float, text, or missing marker)
//! - [`DataType`] - Inferred column type
//! - [`CleaningRequest`] - Which cleaning operations to run
//! - [`ExportTarget`] - Output format (CSV or spreadsheet)
//! - [`FileFormat`] - Input format, resolved from the file extension

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DatasetError, DatasetResult, IngestError};

// =============================================================================
// Cell
// =============================================================================

/// A single cell value.
///
/// Serializes as a plain JSON number, string, or `null` for [`Cell::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Integer value.
    Int(i64),
    /// Floating point value. Never NaN: absent values are [`Cell::Missing`].
    Float(f64),
    /// Text value.
    Text(String),
    /// Missing marker (not zero, not empty string).
    Missing,
}

impl Cell {
    /// Create a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric value of the cell, if it holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}

/// Render a float in shortest round-trip form, keeping a `.0` on integral values.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

// =============================================================================
// Data Type
// =============================================================================

/// Column type decided at ingest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Whole numbers, no missing cells.
    Int64,
    /// Numbers with at least one fractional value or missing cell.
    Float64,
    /// Anything else.
    #[serde(rename = "text")]
    Utf8,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    /// Infer the type of a column of already-typed cells.
    ///
    /// Any text makes the column `Utf8`. A numeric column with a float or a
    /// missing cell is `Float64`, and so is a column with no values at all.
    pub fn infer(cells: &[Cell]) -> Self {
        let mut has_float = false;
        let mut has_missing = false;
        let mut has_int = false;

        for cell in cells {
            match cell {
                Cell::Text(_) => return Self::Utf8,
                Cell::Float(_) => has_float = true,
                Cell::Missing => has_missing = true,
                Cell::Int(_) => has_int = true,
            }
        }

        if has_int && !has_float && !has_missing {
            Self::Int64
        } else {
            Self::Float64
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "text",
        })
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column of cells with a single inferred type.
///
/// Cells always agree with the type: `Int64` columns hold only [`Cell::Int`],
/// `Float64` columns hold [`Cell::Float`] or [`Cell::Missing`], `Utf8` columns
/// hold [`Cell::Text`] or [`Cell::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Build a column, inferring its type and coercing cells to match.
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let dtype = DataType::infer(&cells);
        let cells = cells
            .into_iter()
            .map(|cell| coerce(cell, dtype))
            .collect();

        Self {
            name: name.into(),
            dtype,
            cells,
        }
    }

    /// Build a column whose cells are already known to match `dtype`.
    pub(crate) fn with_type(name: String, dtype: DataType, cells: Vec<Cell>) -> Self {
        Self { name, dtype, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }
}

fn coerce(cell: Cell, dtype: DataType) -> Cell {
    match (dtype, cell) {
        (_, Cell::Missing) => Cell::Missing,
        (DataType::Utf8, Cell::Text(s)) => Cell::Text(s),
        (DataType::Utf8, other) => Cell::Text(other.to_string()),
        (DataType::Float64, Cell::Int(i)) => Cell::Float(i as f64),
        (_, other) => other,
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Ordered named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Create a dataset, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> DatasetResult<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(DatasetError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Create a dataset from a header row and row-major cells.
    ///
    /// Short rows are padded with [`Cell::Missing`]. Column types are inferred.
    pub fn from_rows<S: Into<String>>(
        headers: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Cell>>,
    ) -> DatasetResult<Self> {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let width = headers.len();
        let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); width];

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(DatasetError::RowTooLong {
                    row: row_idx,
                    expected: width,
                    actual: row.len(),
                });
            }
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(Cell::Missing));
            }
        }

        let columns = headers
            .into_iter()
            .zip(columns)
            .map(|(name, cells)| Column::new(name, cells))
            .collect();

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cells of row `index`, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count()).map(move |i| self.columns.iter().map(|c| &c.cells[i]).collect())
    }

    /// First `n` rows as a new dataset (preview).
    pub fn head(&self, n: usize) -> Dataset {
        let take = n.min(self.row_count());
        let columns = self
            .columns
            .iter()
            .map(|c| Column::with_type(c.name.clone(), c.dtype, c.cells[..take].to_vec()))
            .collect();
        Dataset { columns }
    }

    /// Keep only the rows whose flag is `true`. `keep` must have one flag per row.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count());
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Total number of missing cells in numeric columns.
    pub fn missing_numeric_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.dtype.is_numeric())
            .map(Column::missing_count)
            .sum()
    }
}

// =============================================================================
// Cleaning Request
// =============================================================================

/// Cleaning operations to apply to one file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleaningRequest {
    /// Drop rows equal to an earlier row.
    #[serde(default)]
    pub remove_duplicates: bool,
    /// Replace missing numeric cells with the column mean.
    #[serde(default)]
    pub fill_missing_numeric: bool,
}

impl CleaningRequest {
    /// Request both operations.
    pub fn all() -> Self {
        Self {
            remove_duplicates: true,
            fill_missing_numeric: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.remove_duplicates && !self.fill_missing_numeric
    }
}

// =============================================================================
// Export Target
// =============================================================================

/// Serialization format for a cleaned dataset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    #[default]
    Csv,
    #[serde(rename = "xlsx", alias = "spreadsheet", alias = "excel")]
    Spreadsheet,
}

impl ExportTarget {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }

    /// MIME type for download responses.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" | "spreadsheet" => Ok(Self::Spreadsheet),
            other => Err(format!("unknown export format '{}' (expected csv or xlsx)", other)),
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// =============================================================================
// File Format
// =============================================================================

/// Spreadsheet extensions the reader understands.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Input format of an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Resolve the format from a filename's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        Self::from_extension(&extension)
    }

    /// Resolve the format from an extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Result<Self, IngestError> {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if ext == "csv" {
            Ok(Self::Csv)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Spreadsheet)
        } else if ext.is_empty() {
            Err(IngestError::unsupported("(none)"))
        } else {
            Err(IngestError::unsupported(format!(".{}", ext)))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

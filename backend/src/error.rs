//! Error types for the Data Sweeper pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DatasetError`] - Inconsistent dataset shapes
//! - [`IngestError`] - Reading an uploaded file into a [`crate::models::Dataset`]
//! - [`ExportError`] - Serializing a dataset to CSV or spreadsheet bytes
//! - [`PipelineError`] - Per-file orchestration errors
//! - [`ServerError`] - HTTP layer errors
//! - [`ConfigError`] - Environment configuration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Dataset Shape Errors
// =============================================================================

/// Errors when assembling a dataset whose shape is inconsistent.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    /// A column does not have as many cells as the first column.
    #[error("Column '{column}' has {actual} cells, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A row has more cells than there are columns.
    #[error("Row {row} has {actual} cells but there are only {expected} columns")]
    RowTooLong {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Ingest Errors
// =============================================================================

/// Errors while turning uploaded bytes into a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file extension is neither `.csv` nor a known spreadsheet extension.
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    /// The bytes are not valid for the declared format.
    #[error("Failed to parse '{file}': {message}")]
    Parse { file: String, message: String },

    /// The file could not be read from disk.
    #[error("Failed to read '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn unsupported(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Name of the file the error refers to, when known.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFormat { .. } => None,
            Self::Parse { file, .. } | Self::Io { file, .. } => Some(file),
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a dataset.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer failure (row/column limits, invalid sheet data).
    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// IO error while flushing the output buffer.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Per-file pipeline errors.
///
/// This is the error type recorded in a [`crate::transform::pipeline::FileReport`]
/// when one file of a batch fails. It never aborts the batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingest error.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Short machine-readable error kind, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(IngestError::UnsupportedFormat { .. }) => "unsupported_format",
            Self::Ingest(IngestError::Parse { .. }) => "parse_error",
            Self::Ingest(IngestError::Io { .. }) => "io_error",
            Self::Export(_) => "export_error",
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dataset construction.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // IngestError -> PipelineError
        let err = IngestError::unsupported(".txt");
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains(".txt"));
        assert_eq!(pipeline_err.kind(), "unsupported_format");

        // PipelineError -> ServerError
        let server_err: ServerError = pipeline_err.into();
        assert!(server_err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = IngestError::parse("sales.csv", "line 4: expected 3 fields, found 5");
        let msg = err.to_string();
        assert!(msg.contains("sales.csv"));
        assert!(msg.contains("line 4"));
        assert_eq!(err.file(), Some("sales.csv"));
    }

    #[test]
    fn test_unsupported_has_no_file() {
        assert_eq!(IngestError::unsupported(".pdf").file(), None);
    }
}

//! # Data Sweeper - CSV and spreadsheet cleaning
//!
//! Data Sweeper takes uploaded CSV or spreadsheet files, previews them,
//! optionally removes duplicate rows and fills missing numeric values with
//! column means, and exports the result as CSV or `.xlsx`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│  Transform  │────▶│   Export    │
//! │   (bytes)   │     │ (auto-enc)  │     │ (dedup+fill)│     │ (csv/xlsx)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sweeper::{ingest, remove_duplicates, fill_missing_numeric, export, ExportTarget, ParseOptions};
//!
//! let mut parsed = ingest(&std::fs::read("sales.csv")?, "sales.csv", &ParseOptions::default())?;
//! let removed = remove_duplicates(&mut parsed.dataset);
//! let filled = fill_missing_numeric(&mut parsed.dataset);
//! let bytes = export(&parsed.dataset, ExportTarget::Spreadsheet)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Dataset, cells, cleaning request, export target
//! - [`parser`] - CSV and spreadsheet ingest with auto-detection
//! - [`transform`] - Dedup, mean-fill and the per-file pipeline
//! - [`export`] - CSV and spreadsheet writers
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingest
pub mod parser;

// Cleaning
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DatasetError, ExportError, IngestError, PipelineError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, CleaningRequest, Column, DataType, Dataset, ExportTarget, FileFormat};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, ingest, ingest_path, parse_csv_bytes,
    parse_csv_str, parse_spreadsheet, ParseOptions, ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    clean, fill_missing_numeric, process_batch, process_file, remove_duplicates,
    CleaningReport, FileOutcome, FileReport, ProcessOptions, Upload,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{cleaned_file_name, export};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, FileResponse, PreviewTable, UploadResponse};
pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}

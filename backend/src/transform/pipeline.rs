//! High-level pipeline API: ingest, clean and export uploaded files.
//!
//! Each file is handled on its own. A failing file produces an error in its
//! own [`FileOutcome`] and the rest of the batch carries on.
//!
//! # Example
//!
//! ```rust,ignore
//! use sweeper::{process_batch, ProcessOptions, Upload, CleaningRequest, ExportTarget};
//!
//! let uploads = vec![Upload::new("sales.csv", std::fs::read("sales.csv")?)];
//! let options = ProcessOptions {
//!     request: CleaningRequest::all(),
//!     export: Some(ExportTarget::Spreadsheet),
//!     ..Default::default()
//! };
//!
//! for outcome in process_batch(&uploads, &options) {
//!     match outcome.result {
//!         Ok(report) => println!("{}: {} rows", outcome.file_name, report.row_count),
//!         Err(e) => eprintln!("{}: {}", outcome.file_name, e),
//!     }
//! }
//! ```

use serde::Serialize;

use super::dedup::remove_duplicates;
use super::fill::fill_missing_numeric;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_success_indent};
use crate::error::PipelineResult;
use crate::export::{cleaned_file_name, export};
use crate::models::{CleaningRequest, DataType, Dataset, ExportTarget, FileFormat};
use crate::parser::{ingest, ParseOptions};

/// Default number of rows kept for the preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// One uploaded file: its name (the extension picks the reader) and raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Options for processing one file.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Cleaning operations to apply
    pub request: CleaningRequest,
    /// Export format, if the cleaned file should be serialized
    pub export: Option<ExportTarget>,
    /// Number of rows kept for the preview
    pub preview_rows: usize,
    /// Ingest options
    pub parse: ParseOptions,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            request: CleaningRequest::default(),
            export: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            parse: ParseOptions::default(),
        }
    }
}

/// Counts reported by the cleaning step. `None` means the operation was not requested.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub duplicates_removed: Option<usize>,
    pub missing_filled: Option<usize>,
}

/// Column metadata shown next to the preview.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: DataType,
    pub missing: usize,
}

/// A serialized cleaned file, ready for download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub target: ExportTarget,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub fn mime_type(&self) -> &'static str {
        self.target.mime_type()
    }
}

/// Everything known about one successfully processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub size_bytes: usize,
    pub format: FileFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    /// Row count right after ingest
    pub original_row_count: usize,
    /// Row count after cleaning
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
    /// First rows of the file as uploaded
    pub preview: Dataset,
    pub cleaning: CleaningReport,
    pub export: Option<ExportedFile>,
    /// The cleaned dataset
    pub dataset: Dataset,
}

impl FileReport {
    /// Upload size in KB.
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Result for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: PipelineResult<FileReport>,
}

/// Apply the requested operations: duplicates first, then the mean-fill.
pub fn clean(dataset: &mut Dataset, request: &CleaningRequest) -> CleaningReport {
    let mut report = CleaningReport::default();

    if request.remove_duplicates {
        report.duplicates_removed = Some(remove_duplicates(dataset));
    }
    if request.fill_missing_numeric {
        report.missing_filled = Some(fill_missing_numeric(dataset));
    }

    report
}

/// Summaries of every column, in order.
pub fn summarize_columns(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name.clone(),
            dtype: c.dtype,
            missing: c.missing_count(),
        })
        .collect()
}

/// Ingest, clean and optionally export one file.
pub fn process_file(upload: &Upload, options: &ProcessOptions) -> PipelineResult<FileReport> {
    log_info(format!(
        "📄 File: {} ({:.2} KB)",
        upload.file_name,
        upload.bytes.len() as f64 / 1024.0
    ));

    let parsed = ingest(&upload.bytes, &upload.file_name, &options.parse)?;
    let mut dataset = parsed.dataset;

    if let Some(ref encoding) = parsed.encoding {
        log_info_indent(format!("Encoding: {}", encoding), 1);
    }
    if let Some(delimiter) = parsed.delimiter {
        log_info_indent(format!("Delimiter: '{}'", format_delimiter(delimiter)), 1);
    }
    log_success(format!(
        "Read {} rows × {} columns",
        dataset.row_count(),
        dataset.column_count()
    ));

    let preview = dataset.head(options.preview_rows);
    let original_row_count = dataset.row_count();

    let cleaning = clean(&mut dataset, &options.request);
    if let Some(removed) = cleaning.duplicates_removed {
        log_success_indent(format!("Removed {} duplicate rows.", removed), 1);
    }
    if let Some(filled) = cleaning.missing_filled {
        log_success_indent(format!("Filled {} missing numeric values.", filled), 1);
    }

    let export = match options.export {
        Some(target) => {
            let bytes = export(&dataset, target)?;
            let file_name = cleaned_file_name(&upload.file_name, target);
            log_success(format!("💾 {} ({} bytes)", file_name, bytes.len()));
            Some(ExportedFile {
                file_name,
                target,
                bytes,
            })
        }
        None => None,
    };

    Ok(FileReport {
        file_name: upload.file_name.clone(),
        size_bytes: upload.bytes.len(),
        format: parsed.format,
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        original_row_count,
        row_count: dataset.row_count(),
        columns: summarize_columns(&dataset),
        preview,
        cleaning,
        export,
        dataset,
    })
}

/// Process every upload independently, in order.
pub fn process_batch(uploads: &[Upload], options: &ProcessOptions) -> Vec<FileOutcome> {
    uploads
        .iter()
        .map(|upload| {
            let result = process_file(upload, options);
            if let Err(ref e) = result {
                log_error(format!("{}: {}", upload.file_name, e));
            }
            FileOutcome {
                file_name: upload.file_name.clone(),
                result,
            }
        })
        .collect()
}

/// Count of failed outcomes in a batch.
pub fn failure_count(outcomes: &[FileOutcome]) -> usize {
    outcomes.iter().filter(|o| o.result.is_err()).count()
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IngestError, PipelineError};
    use crate::models::Cell;

    #[test]
    fn test_default_options() {
        let opts = ProcessOptions::default();
        assert_eq!(opts.preview_rows, 5);
        assert!(opts.request.is_empty());
        assert!(opts.export.is_none());
    }

    #[test]
    fn test_clean_only_requested_operations() {
        let mut ds = Dataset::from_rows(
            ["k", "v"],
            vec![
                vec![Cell::text("a"), Cell::Missing],
                vec![Cell::text("a"), Cell::Missing],
                vec![Cell::text("b"), Cell::Float(4.0)],
            ],
        )
        .unwrap();

        let report = clean(&mut ds, &CleaningRequest::default());
        assert_eq!(report, CleaningReport::default());
        assert_eq!(ds.row_count(), 3);

        let report = clean(
            &mut ds,
            &CleaningRequest {
                remove_duplicates: true,
                fill_missing_numeric: false,
            },
        );
        assert_eq!(report.duplicates_removed, Some(1));
        assert_eq!(report.missing_filled, None);

        let report = clean(&mut ds, &CleaningRequest::all());
        assert_eq!(report.duplicates_removed, Some(0));
        assert_eq!(report.missing_filled, Some(1));
        assert_eq!(ds.column("v").unwrap().cells[0], Cell::Float(4.0));
    }

    #[test]
    fn test_duplicates_removed_before_mean_is_taken() {
        let mut ds = Dataset::from_rows(
            ["v"],
            vec![
                vec![Cell::Int(1)],
                vec![Cell::Int(1)],
                vec![Cell::Missing],
                vec![Cell::Int(4)],
            ],
        )
        .unwrap();

        let report = clean(&mut ds, &CleaningRequest::all());
        assert_eq!(report.duplicates_removed, Some(1));
        assert_eq!(
            ds.column("v").unwrap().cells,
            vec![Cell::Float(1.0), Cell::Float(2.5), Cell::Float(4.0)]
        );
    }

    #[test]
    fn test_process_file_with_export() {
        let upload = Upload::new("parts.csv", b"name,qty\nbolt,1\nbolt,1\nnut,\nwasher,3\n".to_vec());
        let options = ProcessOptions {
            request: CleaningRequest::all(),
            export: Some(ExportTarget::Csv),
            ..Default::default()
        };

        let report = process_file(&upload, &options).unwrap();
        assert_eq!(report.original_row_count, 4);
        assert_eq!(report.row_count, 3);
        assert_eq!(report.preview.row_count(), 4);
        assert_eq!(report.cleaning.duplicates_removed, Some(1));
        assert_eq!(report.cleaning.missing_filled, Some(1));
        assert_eq!(report.delimiter, Some(','));

        let exported = report.export.unwrap();
        assert_eq!(exported.file_name, "parts.csv_cleaned.csv");
        assert_eq!(exported.mime_type(), "text/csv");
        assert_eq!(
            String::from_utf8(exported.bytes).unwrap(),
            "name,qty\nbolt,1.0\nnut,2.0\nwasher,3.0\n"
        );
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let uploads = vec![
            Upload::new("notes.txt", b"hello".to_vec()),
            Upload::new("good.csv", b"a\n1\n1\n".to_vec()),
            Upload::new("empty.csv", Vec::new()),
        ];
        let options = ProcessOptions {
            request: CleaningRequest::all(),
            ..Default::default()
        };

        let outcomes = process_batch(&uploads, &options);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[0].result,
            Err(PipelineError::Ingest(IngestError::UnsupportedFormat { .. }))
        ));
        assert_eq!(outcomes[1].result.as_ref().unwrap().row_count, 1);
        assert!(matches!(
            outcomes[2].result,
            Err(PipelineError::Ingest(IngestError::Parse { .. }))
        ));
        assert_eq!(failure_count(&outcomes), 2);
    }

    #[test]
    fn test_size_kb() {
        let report = process_file(
            &Upload::new("a.csv", vec![b'x'; 2048]),
            &ProcessOptions::default(),
        )
        .unwrap();
        assert!((report.size_kb() - 2.0).abs() < f64::EPSILON);
    }
}

//! REST API types for frontend integration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Cell, CleaningRequest, Dataset, ExportTarget, FileFormat};
use crate::transform::pipeline::{CleaningReport, ColumnSummary, FileOutcome, FileReport};

/// Response sent after an upload: one entry per file, in upload order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" (all files ok), "warning" (some failed), "error" (all failed)
    pub status: String,

    /// Cleaning operations that were applied
    pub request: CleaningRequest,

    pub files: Vec<FileResponse>,
}

impl UploadResponse {
    pub fn from_outcomes(outcomes: Vec<FileOutcome>, request: CleaningRequest) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let status = if failed == 0 {
            "ready"
        } else if failed < outcomes.len() {
            "warning"
        } else {
            "error"
        };

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            request,
            files: outcomes.into_iter().map(FileResponse::from).collect(),
        }
    }
}

/// Result for one uploaded file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub file_name: String,

    /// "ok" or "error"
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,

    /// First rows of the file as uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewTable>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningReport>,

    /// Suggested download names per format
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<DownloadLink>,
}

/// Error details for a failed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    /// Machine-readable kind ("unsupported_format", "parse_error", ...)
    pub kind: String,
    pub message: String,
}

/// File metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub size_bytes: usize,
    /// Size in KB with two decimals, e.g. "1.25 KB"
    pub size: String,
    pub format: FileFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub original_row_count: usize,
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Preview table in row-major form.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl From<&Dataset> for PreviewTable {
    fn from(dataset: &Dataset) -> Self {
        PreviewTable {
            columns: dataset.headers().into_iter().map(str::to_string).collect(),
            rows: dataset
                .rows()
                .map(|row| row.into_iter().cloned().collect())
                .collect(),
        }
    }
}

/// How to fetch the cleaned file in one format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub format: ExportTarget,
    pub file_name: String,
    pub mime_type: String,
}

impl From<FileOutcome> for FileResponse {
    fn from(outcome: FileOutcome) -> Self {
        match outcome.result {
            Ok(report) => FileResponse::from(report),
            Err(e) => FileResponse {
                file_name: outcome.file_name,
                status: "error".to_string(),
                error: Some(FileError {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
                metadata: None,
                preview: None,
                cleaning: None,
                downloads: Vec::new(),
            },
        }
    }
}

impl From<FileReport> for FileResponse {
    fn from(report: FileReport) -> Self {
        let downloads = [ExportTarget::Csv, ExportTarget::Spreadsheet]
            .into_iter()
            .map(|target| DownloadLink {
                format: target,
                file_name: crate::export::cleaned_file_name(&report.file_name, target),
                mime_type: target.mime_type().to_string(),
            })
            .collect();

        FileResponse {
            status: "ok".to_string(),
            error: None,
            metadata: Some(FileMetadata {
                size_bytes: report.size_bytes,
                size: format!("{:.2} KB", report.size_kb()),
                format: report.format,
                encoding: report.encoding.clone(),
                delimiter: report
                    .delimiter
                    .map(crate::transform::pipeline::format_delimiter),
                original_row_count: report.original_row_count,
                row_count: report.row_count,
                columns: report.columns.clone(),
            }),
            preview: Some(PreviewTable::from(&report.preview)),
            cleaning: Some(report.cleaning),
            downloads,
            file_name: report.file_name,
        }
    }
}

/// Create an error response
pub fn error_response(kind: &str, error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": {
            "kind": kind,
            "message": error,
        },
        "files": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::{process_batch, ProcessOptions, Upload};

    fn outcomes() -> Vec<FileOutcome> {
        let uploads = vec![
            Upload::new("a.csv", b"x,y\n1,2\n1,2\n".to_vec()),
            Upload::new("b.txt", b"x".to_vec()),
        ];
        let options = ProcessOptions {
            request: CleaningRequest::all(),
            ..Default::default()
        };
        process_batch(&uploads, &options)
    }

    #[test]
    fn test_upload_response_shape() {
        let response = UploadResponse::from_outcomes(outcomes(), CleaningRequest::all());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "warning");
        assert_eq!(json["files"][0]["status"], "ok");
        assert_eq!(json["files"][0]["metadata"]["rowCount"], 1);
        assert_eq!(json["files"][0]["metadata"]["originalRowCount"], 2);
        assert_eq!(json["files"][0]["cleaning"]["duplicatesRemoved"], 1);
        assert_eq!(json["files"][0]["preview"]["rows"][0][0], 1);
        assert_eq!(json["files"][0]["downloads"][1]["fileName"], "a.csv_cleaned.xlsx");
        assert_eq!(json["files"][1]["error"]["kind"], "unsupported_format");
        assert!(json["files"][1].get("preview").is_none());
    }

    #[test]
    fn test_preview_table_from_dataset() {
        let ds = Dataset::from_rows(["a"], vec![vec![Cell::Missing], vec![Cell::Int(2)]]).unwrap();
        let table = PreviewTable::from(&ds);
        assert_eq!(table.columns, vec!["a"]);
        assert_eq!(table.rows, vec![vec![Cell::Missing], vec![Cell::Float(2.0)]]);
    }

    #[test]
    fn test_error_response() {
        let body = error_response("bad_request", "No file provided");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["message"], "No file provided");
    }
}

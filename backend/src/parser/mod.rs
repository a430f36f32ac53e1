//! Ingest: uploaded bytes to a typed [`Dataset`].
//!
//! The file extension picks the reader. CSV content goes through encoding and
//! delimiter auto-detection before the `csv` crate splits fields; spreadsheets
//! are read with `calamine` (see [`spreadsheet`]). Column types are inferred
//! from the values (see [`infer`]).

pub mod infer;
pub mod spreadsheet;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::models::{Dataset, FileFormat};
use infer::{column_from_fields, normalize_headers};

pub use spreadsheet::parse_spreadsheet;

/// Options for ingest.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Force a CSV delimiter instead of auto-detecting it.
    pub delimiter: Option<char>,
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed dataset
    pub dataset: Dataset,
    /// Input format resolved from the extension
    pub format: FileFormat,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected or used delimiter (CSV only)
    pub delimiter: Option<char>,
}

/// Parse an uploaded file. The extension of `file_name` picks the reader.
///
/// # Example
/// ```ignore
/// let result = ingest(b"name,qty\nbolt,3\n", "parts.csv", &ParseOptions::default())?;
/// assert_eq!(result.dataset.row_count(), 1);
/// ```
pub fn ingest(bytes: &[u8], file_name: &str, options: &ParseOptions) -> IngestResult<ParseResult> {
    match FileFormat::from_file_name(file_name)? {
        FileFormat::Csv => parse_csv_bytes(bytes, file_name, options.delimiter),
        FileFormat::Spreadsheet => Ok(ParseResult {
            dataset: parse_spreadsheet(bytes, file_name)?,
            format: FileFormat::Spreadsheet,
            encoding: None,
            delimiter: None,
        }),
    }
}

/// Read a file from disk and parse it.
pub fn ingest_path<P: AsRef<Path>>(path: P, options: &ParseOptions) -> IngestResult<ParseResult> {
    let path = path.as_ref();
    let file_name = display_name(path);

    // Reject unknown extensions before touching the disk.
    FileFormat::from_file_name(&file_name)?;

    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        file: file_name.clone(),
        source,
    })?;

    ingest(&bytes, &file_name, options)
}

/// File name component of a path, used in reports and output names.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown labels and invalid UTF-8 fall back to a lossy conversion. A leading
/// byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first non-blank line.
///
/// Ties go to the comma, and a line without any candidate is comma-separated.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with encoding and (optionally) delimiter auto-detection.
pub fn parse_csv_bytes(
    bytes: &[u8],
    file_name: &str,
    delimiter: Option<char>,
) -> IngestResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    let dataset = parse_csv_str(&content, delimiter, file_name)?;

    Ok(ParseResult {
        dataset,
        format: FileFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// The first record is the header. Short rows are padded with missing cells,
/// rows with more fields than the header are rejected, blank lines are skipped.
pub fn parse_csv_str(content: &str, delimiter: char, file_name: &str) -> IngestResult<Dataset> {
    if !delimiter.is_ascii() {
        return Err(IngestError::parse(
            file_name,
            format!("Delimiter '{}' is not a single-byte character", delimiter),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = loop {
        match records.next() {
            None => return Err(IngestError::parse(file_name, "No columns to parse from file")),
            Some(Err(e)) => return Err(IngestError::parse(file_name, e.to_string())),
            Some(Ok(record)) if is_blank(&record, content) => continue,
            Some(Ok(record)) => break record,
        }
    };

    let headers = normalize_headers(header.iter().map(str::to_string).collect());
    let width = headers.len();
    let mut fields: Vec<Vec<String>> = vec![Vec::new(); width];

    for record in records {
        let record = record.map_err(|e| IngestError::parse(file_name, e.to_string()))?;
        if is_blank(&record, content) {
            continue;
        }

        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(IngestError::parse(
                file_name,
                format!(
                    "Line {}: expected {} fields, saw {}",
                    line,
                    width,
                    record.len()
                ),
            ));
        }

        for (idx, column) in fields.iter_mut().enumerate() {
            column.push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(fields)
        .map(|(name, values)| column_from_fields(name, values))
        .collect();

    Dataset::new(columns).map_err(|e| IngestError::parse(file_name, e.to_string()))
}

/// A whitespace-only, unquoted line. A quoted empty field (`""`) is a real
/// row holding one missing value.
fn is_blank(record: &csv::StringRecord, content: &str) -> bool {
    if record.len() > 1 || !record.iter().all(|f| f.trim().is_empty()) {
        return false;
    }

    // The record position may sit on line breaks left over from skipped empty lines.
    let start = record.position().map_or(0, |p| p.byte() as usize);
    !content
        .get(start..)
        .unwrap_or("")
        .trim_start_matches(|c: char| c == '\r' || c == '\n')
        .trim_start_matches(|c: char| c == ' ' || c == '\t')
        .starts_with('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, DataType};

    fn parse(csv: &str) -> Dataset {
        parse_csv_bytes(csv.as_bytes(), "test.csv", None).unwrap().dataset
    }

    #[test]
    fn test_simple_csv() {
        let ds = parse("name,age\nAlice,30\nBob,25");

        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.headers(), vec!["name", "age"]);
        assert_eq!(ds.column("age").unwrap().dtype, DataType::Int64);
        assert_eq!(ds.row(0).unwrap(), vec![&Cell::text("Alice"), &Cell::Int(30)]);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let result = parse_csv_bytes(b"a;b;c\n1;2;3", "x.csv", None).unwrap();
        assert_eq!(result.delimiter, Some(';'));
        assert_eq!(result.dataset.column_count(), 3);
    }

    #[test]
    fn test_forced_delimiter() {
        let result = parse_csv_bytes(b"a;b,c\n1;2,3", "x.csv", Some(';')).unwrap();
        assert_eq!(result.dataset.headers(), vec!["a", "b,c"]);
        assert_eq!(result.dataset.column("b,c").unwrap().dtype, DataType::Utf8);
    }

    #[test]
    fn test_quoted_values() {
        let ds = parse("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"");
        assert_eq!(ds.row(0).unwrap()[0], &Cell::text("Smith, J"));
        assert_eq!(ds.row(0).unwrap()[1], &Cell::text("said \"hi\""));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let ds = parse("a,b\n1,2\n\n3,4\n");
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_missing_values() {
        let ds = parse("a,b,c\n1,,3\n4,5,NA");

        assert_eq!(ds.column("b").unwrap().cells, vec![Cell::Missing, Cell::Float(5.0)]);
        assert_eq!(ds.column("c").unwrap().dtype, DataType::Float64);
        assert_eq!(ds.missing_numeric_count(), 2);
    }

    #[test]
    fn test_short_rows_padded() {
        let ds = parse("a,b,c\n1,2\n4,5,6");
        assert_eq!(ds.column("c").unwrap().cells, vec![Cell::Missing, Cell::Float(6.0)]);
    }

    #[test]
    fn test_long_rows_rejected() {
        let err = parse_csv_bytes(b"a,b\n1,2\n1,2,3,4", "wide.csv", None).unwrap_err();
        match err {
            IngestError::Parse { file, message } => {
                assert_eq!(file, "wide.csv");
                assert!(message.contains("Line 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_csv_error() {
        let err = parse_csv_bytes(b"", "empty.csv", None).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn test_header_only() {
        let ds = parse("a,b\n");
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 2);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let ds = parse("id,,id\n1,2,3");
        assert_eq!(ds.headers(), vec!["id", "Unnamed: 1", "id.1"]);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
        assert_eq!(detect_delimiter("a;b,c"), ',');
    }

    #[test]
    fn test_delimiter_from_first_non_blank_line() {
        assert_eq!(detect_delimiter("\n  \na;b;c\n1;2;3"), ';');

        let result = parse_csv_bytes(b"\na;b\n1;2\n", "lead.csv", None).unwrap();
        assert_eq!(result.delimiter, Some(';'));
        assert_eq!(result.dataset.headers(), vec!["a", "b"]);
    }

    #[test]
    fn test_quoted_empty_field_is_a_row() {
        let ds = parse("v\n1\n\"\"\n3\n");
        assert_eq!(
            ds.column("v").unwrap().cells,
            vec![Cell::Float(1.0), Cell::Missing, Cell::Float(3.0)]
        );

        let ds = parse("v\r\n1\r\n\"\"\r\n3\r\n");
        assert_eq!(ds.row_count(), 3);

        let ds = parse("v\n1\n   \n3\n");
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_bom_stripped() {
        let ds = parse("\u{feff}id,name\n1,x");
        assert_eq!(ds.headers(), vec!["id", "name"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ingest(b"a,b\n1,2", "notes.txt", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { ref extension } if extension == ".txt"));
    }

    #[test]
    fn test_ingest_dispatches_csv() {
        let result = ingest(b"a,b\n1,2", "DATA.CSV", &ParseOptions::default()).unwrap();
        assert_eq!(result.format, FileFormat::Csv);
        assert_eq!(result.encoding.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_ingest_path_missing_file() {
        let err = ingest_path("/nonexistent/dir/input.csv", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Io { ref file, .. } if file == "input.csv"));
    }
}

//! Spreadsheet reader (xlsx, xlsm, xlsb, xls, ods) built on `calamine`.
//!
//! Only the first worksheet is read. The first row of its used range is the header.

use calamine::{open_workbook_auto_from_rs, Data, DataType as _, Reader};
use std::io::Cursor;

use super::infer::{is_missing, normalize_headers};
use crate::error::{IngestError, IngestResult};
use crate::models::{Cell, Column, Dataset};

/// Parse workbook bytes into a dataset.
pub fn parse_spreadsheet(bytes: &[u8], file_name: &str) -> IngestResult<Dataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::parse(file_name, format!("Cannot open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::parse(file_name, "Workbook has no sheets"))?
        .map_err(|e| IngestError::parse(file_name, format!("Cannot read first sheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| IngestError::parse(file_name, "First sheet is empty"))?;

    let headers = normalize_headers(header_row.iter().map(header_text).collect());
    let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(range.height()); headers.len()];

    for row in rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(row.get(idx).map(sheet_cell).unwrap_or(Cell::Missing));
        }
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();

    Dataset::new(columns).map_err(|e| IngestError::parse(file_name, e.to_string()))
}

/// Convert one worksheet cell into a dataset cell.
///
/// Integral floats become integers, as spreadsheets store every number as a float.
fn sheet_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => float_cell(*f),
        Data::String(s) if is_missing(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::text(if *b { "True" } else { "False" }),
        Data::DateTime(dt) => match data.as_datetime() {
            Some(naive) => Cell::Text(naive.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Missing,
    }
}

fn float_cell(f: f64) -> Cell {
    if f.is_nan() {
        Cell::Missing
    } else if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Cell::Int(f as i64)
    } else {
        Cell::Float(f)
    }
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty | Data::Error(_) => String::new(),
        other => sheet_cell(other).to_string(),
    }
}

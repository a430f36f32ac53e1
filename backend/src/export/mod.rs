//! Export: serialize a [`Dataset`] to CSV or spreadsheet bytes.
//!
//! Both writers emit the header row followed by every row in order, with no
//! index column. Output depends only on the dataset content and the target.

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook};

use crate::error::{ExportError, ExportResult};
use crate::models::{Cell, Dataset, ExportTarget};

/// Name of the single worksheet written to spreadsheet exports.
pub const SHEET_NAME: &str = "Sheet1";

/// Serialize the dataset in the requested format.
pub fn export(dataset: &Dataset, target: ExportTarget) -> ExportResult<Vec<u8>> {
    match target {
        ExportTarget::Csv => to_csv(dataset),
        ExportTarget::Spreadsheet => to_xlsx(dataset),
    }
}

/// Comma separated, `\n` terminated, quoted only where needed.
pub fn to_csv(dataset: &Dataset) -> ExportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(dataset.headers())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Single-sheet `.xlsx` workbook.
pub fn to_xlsx(dataset: &Dataset) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();

    // Pin the document timestamp so identical data gives identical bytes.
    let properties = DocProperties::new()
        .set_creation_datetime(&ExcelDateTime::from_ymd(2000, 1, 1)?);
    workbook.set_properties(&properties);

    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, column) in dataset.columns().iter().enumerate() {
        let col = sheet_col(col)?;
        worksheet.write_string_with_format(0, col, &column.name, &header_format)?;

        for (idx, cell) in column.cells.iter().enumerate() {
            let row = sheet_row(idx + 1)?;
            match cell {
                Cell::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Cell::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Cell::Missing => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn sheet_row(index: usize) -> ExportResult<u32> {
    u32::try_from(index).map_err(|_| rust_xlsxwriter::XlsxError::RowColumnLimitError.into())
}

fn sheet_col(index: usize) -> ExportResult<u16> {
    u16::try_from(index).map_err(|_| rust_xlsxwriter::XlsxError::RowColumnLimitError.into())
}

/// Download name for a cleaned file: `<original_name>_cleaned.<ext>`.
///
/// The original name is kept whole, extension included (`sales.csv` becomes
/// `sales.csv_cleaned.xlsx`).
pub fn cleaned_file_name(original: &str, target: ExportTarget) -> String {
    format!("{}_cleaned.{}", original, target.extension())
}

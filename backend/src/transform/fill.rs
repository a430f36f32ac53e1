//! Mean-fill of missing numeric cells.

use crate::models::{Cell, Dataset};

/// Arithmetic mean of the present values of a column.
///
/// `None` when there are no values, or when the mean is NaN (`inf` and `-inf` together).
pub fn column_mean(cells: &[Cell]) -> Option<f64> {
    let (sum, count) = cells
        .iter()
        .filter_map(Cell::as_f64)
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return None;
    }

    let mean = sum / count as f64;
    (!mean.is_nan()).then_some(mean)
}

/// Replace missing cells of every numeric column with that column's mean.
///
/// Text columns are untouched. Columns without any present value have no
/// mean and stay missing. Returns the number of cells filled.
pub fn fill_missing_numeric(dataset: &mut Dataset) -> usize {
    let mut filled = 0;

    for column in dataset.columns_mut() {
        if !column.dtype.is_numeric() || column.missing_count() == 0 {
            continue;
        }

        let Some(mean) = column_mean(&column.cells) else {
            continue;
        };

        for cell in column.cells.iter_mut().filter(|c| c.is_missing()) {
            *cell = Cell::Float(mean);
            filled += 1;
        }
    }

    filled
}

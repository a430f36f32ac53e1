//! Duplicate row removal.

use std::collections::HashSet;

use crate::models::{Cell, Dataset};

/// Hashable identity of a cell. Missing equals missing, `-0.0` equals `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Int(i64),
    Float(u64),
    Text(&'a str),
    Missing,
}

impl<'a> From<&'a Cell> for CellKey<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) if *f == 0.0 => CellKey::Float(0.0f64.to_bits()),
            Cell::Float(f) => CellKey::Float(f.to_bits()),
            Cell::Text(s) => CellKey::Text(s),
            Cell::Missing => CellKey::Missing,
        }
    }
}

/// Remove rows equal to an earlier row, keeping first occurrences in order.
///
/// Returns the number of rows removed.
pub fn remove_duplicates(dataset: &mut Dataset) -> usize {
    let before = dataset.row_count();

    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(before);
        dataset
            .rows()
            .map(|row| seen.insert(row.into_iter().map(CellKey::from).collect()))
            .collect()
    };

    if keep.iter().all(|k| *k) {
        return 0;
    }

    dataset.retain_rows(&keep);
    before - dataset.row_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(
            ["name", "qty"],
            vec![
                vec![Cell::text("a"), Cell::Int(1)],
                vec![Cell::text("a"), Cell::Int(1)],
                vec![Cell::text("b"), Cell::Int(2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_removes_repeated_row() {
        let mut ds = sample();
        let removed = remove_duplicates(&mut ds);

        assert_eq!(removed, 1);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row(0).unwrap(), vec![&Cell::text("a"), &Cell::Int(1)]);
        assert_eq!(ds.row(1).unwrap(), vec![&Cell::text("b"), &Cell::Int(2)]);
    }

    #[test]
    fn test_idempotent() {
        let mut ds = sample();
        remove_duplicates(&mut ds);
        let once = ds.clone();

        assert_eq!(remove_duplicates(&mut ds), 0);
        assert_eq!(ds, once);
    }

    #[test]
    fn test_missing_cells_compare_equal() {
        let mut ds = Dataset::from_rows(
            ["x", "y"],
            vec![
                vec![Cell::Missing, Cell::text("k")],
                vec![Cell::Missing, Cell::text("k")],
                vec![Cell::Float(0.0), Cell::text("k")],
                vec![Cell::Float(-0.0), Cell::text("k")],
            ],
        )
        .unwrap();

        assert_eq!(remove_duplicates(&mut ds), 2);
        assert_eq!(ds.column("x").unwrap().cells, vec![Cell::Missing, Cell::Float(0.0)]);
    }

    #[test]
    fn test_keeps_first_occurrence_order() {
        let mut ds = Dataset::from_rows(
            ["v"],
            ["c", "a", "c", "b", "a"].iter().map(|v| vec![Cell::text(*v)]).collect(),
        )
        .unwrap();

        assert_eq!(remove_duplicates(&mut ds), 2);
        assert_eq!(
            ds.column("v").unwrap().cells,
            vec![Cell::text("c"), Cell::text("a"), Cell::text("b")]
        );
    }

    #[test]
    fn test_partial_match_is_not_duplicate() {
        let mut ds = Dataset::from_rows(
            ["a", "b"],
            vec![
                vec![Cell::Int(1), Cell::Int(2)],
                vec![Cell::Int(1), Cell::Int(3)],
            ],
        )
        .unwrap();

        assert_eq!(remove_duplicates(&mut ds), 0);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_empty_dataset() {
        let mut ds = Dataset::default();
        assert_eq!(remove_duplicates(&mut ds), 0);
    }
}

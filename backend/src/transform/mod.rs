//! Transformation module.
//!
//! This module handles the cleaning operations:
//! - Dedup: drop rows equal to an earlier row
//! - Fill: replace missing numeric cells with the column mean
//! - Pipeline: per-file and batch orchestration (ingest, clean, export)

pub mod dedup;
pub mod fill;
pub mod pipeline;

pub use dedup::remove_duplicates;
pub use fill::{column_mean, fill_missing_numeric};
pub use pipeline::*;

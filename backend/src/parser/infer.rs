//! Column type inference for text fields and header name cleanup.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::models::{Cell, Column, DataType};

/// Field values read as a missing marker.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A",
    "#NA", "<NA>", "-1.#IND", "1.#QNAN", "-1.#QNAN", "1.#IND",
];

static INT_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer regex"));

static FLOAT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid float regex")
});

static INF_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[+-]?inf(inity)?$").expect("valid infinity regex"));

/// Whether a raw field is a missing marker.
pub fn is_missing(field: &str) -> bool {
    MISSING_TOKENS.contains(&field.trim())
}

/// A field parsed as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

/// Parse a numeric literal. Integers too large for `i64` become floats.
pub fn parse_numeric(field: &str) -> Option<Numeric> {
    let field = field.trim();

    if INT_LITERAL.is_match(field) {
        return match field.parse::<i64>() {
            Ok(i) => Some(Numeric::Int(i)),
            Err(_) => field.parse::<f64>().ok().map(Numeric::Float),
        };
    }

    if FLOAT_LITERAL.is_match(field) || INF_LITERAL.is_match(field) {
        return field.parse::<f64>().ok().map(Numeric::Float);
    }

    None
}

/// Build a typed column from raw text fields.
///
/// The column is numeric when every non-missing field is a numeric literal.
/// Text columns keep the original field text untouched.
pub fn column_from_fields(name: String, fields: Vec<String>) -> Column {
    let mut parsed = Vec::with_capacity(fields.len());
    let mut numeric = true;
    let mut has_missing = false;
    let mut has_float = false;

    for field in &fields {
        if is_missing(field) {
            has_missing = true;
            parsed.push(None);
            continue;
        }
        match parse_numeric(field) {
            Some(n) => {
                has_float |= matches!(n, Numeric::Float(_));
                parsed.push(Some(n));
            }
            None => {
                numeric = false;
                break;
            }
        }
    }

    if !numeric {
        let cells = fields
            .into_iter()
            .map(|f| if is_missing(&f) { Cell::Missing } else { Cell::Text(f) })
            .collect();
        return Column::with_type(name, DataType::Utf8, cells);
    }

    let any_value = parsed.iter().any(Option::is_some);
    if any_value && !has_missing && !has_float {
        let cells = parsed
            .into_iter()
            .map(|n| match n {
                Some(Numeric::Int(i)) => Cell::Int(i),
                Some(Numeric::Float(f)) => Cell::Float(f),
                None => Cell::Missing,
            })
            .collect();
        return Column::with_type(name, DataType::Int64, cells);
    }

    let cells = parsed
        .into_iter()
        .map(|n| match n {
            Some(Numeric::Int(i)) => Cell::Float(i as f64),
            Some(Numeric::Float(f)) => Cell::Float(f),
            None => Cell::Missing,
        })
        .collect();
    Column::with_type(name, DataType::Float64, cells)
}

/// Make header names usable: blank names become `Unnamed: <index>` and
/// repeated names get `.1`, `.2`, ... suffixes in order of appearance.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };

        let mut candidate = base.clone();
        while used.contains(&candidate) {
            let count = counts.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{}.{}", base, count);
        }

        used.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

//! Shared utilities for the dataset processing pipeline.
//!
//! This module contains common helper functions used by the parsers, the
//! splitter and the summary code.

use crate::types::Scalar;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Short dtype name in the style of a dataframe `dtypes` listing.
pub fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::Int64 => "int64".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::String => "object".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("Invalid regex: number"));

/// Strip whitespace and surrounding quotes from a raw field.
pub fn clean_field(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
}

/// Classify a raw field as integer, float, text or missing.
///
/// A field matching `-?digits[.digits]` is numeric; it is a float when it
/// contains a decimal point. Empty fields and `?` are missing.
///
/// # Example
///
/// ```rust,ignore
/// use kdd_processing::utils::sniff_scalar;
/// use kdd_processing::types::Scalar;
///
/// assert_eq!(sniff_scalar(" '7' "), Scalar::Int(7));
/// assert_eq!(sniff_scalar("0.5"), Scalar::Float(0.5));
/// ```
pub fn sniff_scalar(raw: &str) -> Scalar {
    let value = clean_field(raw);
    if value.is_empty() || value == "?" {
        return Scalar::Missing;
    }
    if !NUMBER.is_match(value) {
        return Scalar::Text(value.to_string());
    }
    if !value.contains('.')
        && let Ok(i) = value.parse::<i64>()
    {
        return Scalar::Int(i);
    }
    match value.parse::<f64>() {
        Ok(f) => Scalar::Float(f),
        Err(_) => Scalar::Text(value.to_string()),
    }
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Render every value of a column as an optional string.
///
/// Nulls stay `None`; numbers use polars' string cast.
pub fn column_as_strings(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let as_text = column.as_materialized_series().cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Count occurrences of every non-null value, ordered by value.
pub fn count_values<'a>(values: impl IntoIterator<Item = &'a Option<String>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_scalar() {
        assert_eq!(sniff_scalar("0"), Scalar::Int(0));
        assert_eq!(sniff_scalar(" -12 "), Scalar::Int(-12));
        assert_eq!(sniff_scalar("'3'"), Scalar::Int(3));
        assert_eq!(sniff_scalar("1."), Scalar::Float(1.0));
        assert_eq!(sniff_scalar(".25"), Scalar::Float(0.25));
        assert_eq!(sniff_scalar("tcp"), Scalar::Text("tcp".to_string()));
        assert_eq!(sniff_scalar("1e5"), Scalar::Text("1e5".to_string()));
        assert_eq!(sniff_scalar("?"), Scalar::Missing);
        assert_eq!(sniff_scalar("  "), Scalar::Missing);
    }

    #[test]
    fn test_sniff_scalar_overflowing_integer_becomes_float() {
        assert_eq!(
            sniff_scalar("99999999999999999999"),
            Scalar::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_column_as_strings_and_counts() {
        let column = Column::new("p".into(), &[Some("tcp"), None, Some("udp"), Some("tcp")]);
        let values = column_as_strings(&column).unwrap();
        assert_eq!(values[1], None);

        let counts = count_values(&values);
        assert_eq!(counts.get("tcp"), Some(&2));
        assert_eq!(counts.get("udp"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_dtype_helpers() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert_eq!(dtype_name(&DataType::Float64), "float64");
        assert_eq!(dtype_name(&DataType::String), "object");
    }
}

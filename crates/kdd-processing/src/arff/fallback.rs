//! Header-less NSL-KDD reader.
//!
//! Used when the attribute section is unusable: everything after the `@data`
//! marker is read as comma-separated rows and mapped positionally onto
//! [`NSL_KDD_COLUMNS`]. Rows with the wrong number of fields are dropped.

use super::frame::{ColumnData, build_frame};
use super::schema::NSL_KDD_COLUMNS;
use super::{ArffError, Attribute, AttributeKind, ParsedDataset};
use crate::types::Scalar;
use crate::utils::sniff_scalar;
use tracing::{debug, warn};

const DATA_MARKER: &str = "@data";

/// Parse the rows after `@data` using the fixed NSL-KDD schema.
pub fn parse_nsl_kdd_fallback(text: &str) -> Result<ParsedDataset, ArffError> {
    let mut lines = text.lines().enumerate();
    lines
        .by_ref()
        .find(|(_, line)| line.trim().eq_ignore_ascii_case(DATA_MARKER))
        .ok_or(ArffError::MissingDataMarker)?;

    let width = NSL_KDD_COLUMNS.len();
    let mut cells: Vec<Vec<Scalar>> = (0..width).map(|_| Vec::new()).collect();
    let mut dropped = 0usize;
    let mut kept = 0usize;

    for (idx, raw) in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != width {
            debug!(
                line = idx + 1,
                fields = fields.len(),
                expected = width,
                "Dropping row with wrong field count"
            );
            dropped += 1;
            continue;
        }

        for (column, field) in cells.iter_mut().zip(fields) {
            column.try_reserve(1)?;
            column.push(sniff_scalar(field));
        }
        kept += 1;
    }

    if kept == 0 {
        return Err(ArffError::NoValidRows {
            expected: width,
            dropped,
        });
    }
    if dropped > 0 {
        warn!(kept, dropped, "NSL-KDD fallback dropped malformed rows");
    }

    let columns: Vec<ColumnData> = cells.into_iter().map(ColumnData::from_scalars).collect();
    let attributes = NSL_KDD_COLUMNS
        .iter()
        .zip(&columns)
        .map(|(name, data)| {
            let kind = match data {
                ColumnData::Int(_) => AttributeKind::Integer,
                ColumnData::Float(_) => AttributeKind::Numeric,
                ColumnData::Text(_) => AttributeKind::String,
            };
            Attribute::new(*name, kind)
        })
        .collect();

    let frame = build_frame(NSL_KDD_COLUMNS.iter().copied(), columns)?;
    Ok(ParsedDataset {
        relation: "nsl-kdd".to_string(),
        attributes,
        frame,
        dropped_rows: dropped,
    })
}

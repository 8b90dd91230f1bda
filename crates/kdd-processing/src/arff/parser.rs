//! Strict ARFF reader.
//!
//! Accepts `@RELATION`, `@ATTRIBUTE` and `@DATA` directives (case-insensitive),
//! `%` comments, dense and sparse data rows, and `?` for missing values.
//! Type keywords must be the canonical upper-case `NUMERIC`, `REAL`,
//! `INTEGER` or `STRING`, or a `{...}` enumeration.

use super::frame::{ColumnData, build_frame};
use super::{ArffError, Attribute, AttributeKind, ParsedDataset, split_outside_quotes, unquote};
use std::collections::HashSet;
use tracing::debug;

/// Parse well-formed ARFF text into a table.
pub fn parse_strict(text: &str) -> Result<ParsedDataset, ArffError> {
    let mut relation = String::new();
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut columns: Vec<ColumnData> = Vec::new();
    let mut saw_content = false;
    let mut in_data = false;
    let mut rows = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        saw_content = true;

        if in_data {
            parse_row(line, line_no, &attributes, &mut columns)?;
            rows += 1;
            continue;
        }

        if !line.starts_with('@') {
            return Err(ArffError::UnexpectedLine {
                line: line_no,
                text: line.to_string(),
            });
        }

        let (directive, rest) = split_keyword(line);
        match directive.to_ascii_lowercase().as_str() {
            "@relation" => relation = unquote(rest).0,
            "@attribute" => {
                let attribute = parse_attribute(rest, line_no)?;
                if !seen_names.insert(attribute.name.clone()) {
                    return Err(ArffError::DuplicateAttribute {
                        line: line_no,
                        name: attribute.name,
                    });
                }
                attributes.push(attribute);
            }
            "@data" => {
                if attributes.is_empty() {
                    return Err(ArffError::NoAttributes);
                }
                let expected_rows = count_data_lines(text, line_no);
                for attribute in &attributes {
                    let mut data = ColumnData::for_kind(&attribute.kind);
                    data.try_reserve(expected_rows)?;
                    columns.push(data);
                }
                in_data = true;
            }
            other => {
                return Err(ArffError::UnknownDirective {
                    line: line_no,
                    directive: other.to_string(),
                });
            }
        }
    }

    if !saw_content {
        return Err(ArffError::EmptyDataset);
    }
    if !in_data {
        return Err(ArffError::MissingDataSection);
    }

    debug!(
        relation = %relation,
        attributes = attributes.len(),
        rows,
        "Strict ARFF parse complete"
    );

    let frame = build_frame(attributes.iter().map(|a| a.name.as_str()), columns)?;
    Ok(ParsedDataset {
        relation,
        attributes,
        frame,
        dropped_rows: 0,
    })
}

/// Number of non-blank, non-comment lines after the first `skip` lines.
fn count_data_lines(text: &str, skip: usize) -> usize {
    text.lines()
        .skip(skip)
        .filter(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('%')
        })
        .count()
}

/// Split a directive line into its keyword and the trimmed remainder.
fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    }
}

/// Parse the part of an `@ATTRIBUTE` line after the keyword.
fn parse_attribute(rest: &str, line: usize) -> Result<Attribute, ArffError> {
    let bad = |reason: &str| ArffError::BadAttribute {
        line,
        reason: reason.to_string(),
    };

    let (name, type_spec) = split_attribute_name(rest).ok_or_else(|| bad("missing name or type"))?;
    if name.is_empty() {
        return Err(bad("empty attribute name"));
    }

    let kind = match type_spec {
        "NUMERIC" => AttributeKind::Numeric,
        "REAL" => AttributeKind::Real,
        "INTEGER" => AttributeKind::Integer,
        "STRING" => AttributeKind::String,
        spec if spec.starts_with('{') && spec.ends_with('}') => {
            let inner = &spec[1..spec.len() - 1];
            let values = split_outside_quotes(inner)
                .map_err(|reason| bad(&reason))?
                .into_iter()
                .map(|piece| unquote(piece).0)
                .collect::<Vec<_>>();
            if values.iter().any(|v| v.is_empty()) {
                return Err(bad("empty nominal value"));
            }
            AttributeKind::Nominal(values)
        }
        other => {
            return Err(ArffError::BadAttribute {
                line,
                reason: format!("unsupported type '{other}' for attribute '{name}'"),
            });
        }
    };

    Ok(Attribute::new(name, kind))
}

/// Separate a possibly quoted attribute name from its type specification.
pub(crate) fn split_attribute_name(rest: &str) -> Option<(String, &str)> {
    let rest = rest.trim();
    let first = rest.chars().next()?;

    let (name, remainder) = if first == '\'' || first == '"' {
        let close = rest[1..].find(first)? + 1;
        (rest[1..close].to_string(), &rest[close + 1..])
    } else {
        let end = rest.find(char::is_whitespace)?;
        (rest[..end].to_string(), &rest[end..])
    };

    let type_spec = remainder.trim();
    if type_spec.is_empty() {
        return None;
    }
    Some((name, type_spec))
}

fn parse_row(
    line: &str,
    line_no: usize,
    attributes: &[Attribute],
    columns: &mut [ColumnData],
) -> Result<(), ArffError> {
    if line.starts_with('{') && line.ends_with('}') {
        return parse_sparse_row(&line[1..line.len() - 1], line_no, attributes, columns);
    }

    let pieces = split_outside_quotes(line).map_err(|reason| ArffError::BadRow {
        line: line_no,
        reason,
    })?;
    if pieces.len() != attributes.len() {
        return Err(ArffError::ArityMismatch {
            line: line_no,
            expected: attributes.len(),
            found: pieces.len(),
        });
    }

    for ((piece, attribute), column) in pieces.into_iter().zip(attributes).zip(columns.iter_mut()) {
        let (value, quoted) = unquote(piece);
        let missing = !quoted && value == "?";
        push_value(column, attribute, (!missing).then_some(value.as_str()), line_no)?;
    }
    Ok(())
}

/// Sparse rows list `index value` pairs; omitted numeric values are 0 and
/// omitted nominal values take the first declared value.
fn parse_sparse_row(
    inner: &str,
    line_no: usize,
    attributes: &[Attribute],
    columns: &mut [ColumnData],
) -> Result<(), ArffError> {
    let mut values: Vec<Option<Option<String>>> = vec![None; attributes.len()];

    if !inner.trim().is_empty() {
        let pieces = split_outside_quotes(inner).map_err(|reason| ArffError::BadRow {
            line: line_no,
            reason,
        })?;
        for piece in pieces {
            let piece = piece.trim();
            let (index, value) = piece
                .split_once(char::is_whitespace)
                .ok_or_else(|| ArffError::BadRow {
                    line: line_no,
                    reason: format!("sparse entry '{piece}' is not 'index value'"),
                })?;
            let index: usize = index.parse().map_err(|_| ArffError::BadRow {
                line: line_no,
                reason: format!("invalid sparse index '{index}'"),
            })?;
            if index >= attributes.len() {
                return Err(ArffError::BadRow {
                    line: line_no,
                    reason: format!("sparse index {index} out of range"),
                });
            }
            let (value, quoted) = unquote(value);
            values[index] = Some((quoted || value != "?").then_some(value));
        }
    }

    for ((slot, attribute), column) in values.into_iter().zip(attributes).zip(columns.iter_mut()) {
        let value = match slot {
            Some(explicit) => explicit,
            None => Some(sparse_default(&attribute.kind)),
        };
        push_value(column, attribute, value.as_deref(), line_no)?;
    }
    Ok(())
}

fn sparse_default(kind: &AttributeKind) -> String {
    match kind {
        AttributeKind::Nominal(values) => values.first().cloned().unwrap_or_default(),
        AttributeKind::String => String::new(),
        _ => "0".to_string(),
    }
}

fn push_value(
    column: &mut ColumnData,
    attribute: &Attribute,
    value: Option<&str>,
    line: usize,
) -> Result<(), ArffError> {
    let bad_numeric = |v: &str| ArffError::BadNumeric {
        line,
        attribute: attribute.name.clone(),
        value: v.to_string(),
    };

    match column {
        ColumnData::Float(values) => {
            let parsed = match value {
                Some(v) => Some(v.parse::<f64>().map_err(|_| bad_numeric(v))?),
                None => None,
            };
            values.push(parsed);
        }
        ColumnData::Int(values) => {
            let parsed = match value {
                Some(v) => {
                    let f = v.parse::<f64>().map_err(|_| bad_numeric(v))?;
                    if !f.is_finite() {
                        return Err(bad_numeric(v));
                    }
                    Some(f.trunc() as i64)
                }
                None => None,
            };
            values.push(parsed);
        }
        ColumnData::Text(values) => {
            if let (Some(v), AttributeKind::Nominal(allowed)) = (value, &attribute.kind)
                && !allowed.iter().any(|a| a == v)
            {
                return Err(ArffError::BadNominal {
                    line,
                    attribute: attribute.name.clone(),
                    value: v.to_string(),
                });
            }
            values.push(value.map(str::to_string));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    const SMALL: &str = "% sample\n\
        @RELATION 'kdd sample'\n\
        \n\
        @ATTRIBUTE duration NUMERIC\n\
        @ATTRIBUTE protocol_type {tcp,udp,icmp}\n\
        @ATTRIBUTE 'src bytes' INTEGER\n\
        @ATTRIBUTE note STRING\n\
        @DATA\n\
        0,tcp,491,'hello, world'\n\
        1.5,udp,?,x\n";

    #[test]
    fn test_parse_strict_well_formed() {
        let parsed = parse_strict(SMALL).unwrap();
        assert_eq!(parsed.relation, "kdd sample");
        assert_eq!(parsed.attributes.len(), 4);
        assert_eq!(parsed.attributes[2].name, "src bytes");
        assert_eq!(parsed.frame.shape(), (2, 4));

        let duration = parsed.frame.column("duration").unwrap();
        assert_eq!(duration.dtype(), &DataType::Float64);
        assert_eq!(duration.get(1).unwrap(), AnyValue::Float64(1.5));

        let bytes = parsed.frame.column("src bytes").unwrap();
        assert_eq!(bytes.dtype(), &DataType::Int64);
        assert_eq!(bytes.get(0).unwrap(), AnyValue::Int64(491));
        assert_eq!(bytes.null_count(), 1);

        let note = parsed.frame.column("note").unwrap();
        assert_eq!(note.get(0).unwrap(), AnyValue::String("hello, world"));
    }

    #[test]
    fn test_empty_input_is_reported_distinctly() {
        assert_eq!(parse_strict("").unwrap_err(), ArffError::EmptyDataset);
        assert_eq!(
            parse_strict("\n  \n% only comments\n").unwrap_err(),
            ArffError::EmptyDataset
        );
    }

    #[test]
    fn test_missing_data_section() {
        let err = parse_strict("@RELATION r\n@ATTRIBUTE a NUMERIC\n").unwrap_err();
        assert_eq!(err, ArffError::MissingDataSection);
    }

    #[test]
    fn test_lowercase_type_is_rejected() {
        let err = parse_strict("@relation r\n@attribute protocol_type string\n@data\ntcp\n")
            .unwrap_err();
        assert!(matches!(err, ArffError::BadAttribute { line: 2, .. }));
    }

    #[test]
    fn test_undeclared_nominal_value_is_rejected() {
        let err = parse_strict("@ATTRIBUTE p {tcp,udp}\n@DATA\nicmp\n").unwrap_err();
        assert!(matches!(err, ArffError::BadNominal { line: 3, .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = parse_strict("@ATTRIBUTE a NUMERIC\n@ATTRIBUTE b NUMERIC\n@DATA\n1\n").unwrap_err();
        assert_eq!(
            err,
            ArffError::ArityMismatch {
                line: 4,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse_strict("@ATTRIBUTE a NUMERIC\n@ATTRIBUTE a STRING\n@DATA\n").unwrap_err();
        assert!(matches!(err, ArffError::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_zero_rows_is_valid() {
        let parsed = parse_strict("@ATTRIBUTE a NUMERIC\n@DATA\n").unwrap();
        assert_eq!(parsed.frame.height(), 0);
        assert_eq!(parsed.frame.width(), 1);
    }

    #[test]
    fn test_sparse_rows_fill_defaults() {
        let text = "@ATTRIBUTE a NUMERIC\n@ATTRIBUTE p {tcp,udp}\n@ATTRIBUTE c NUMERIC\n\
                    @DATA\n{2 7}\n{0 1.5, 1 udp}\n";
        let parsed = parse_strict(text).unwrap();
        let a = parsed.frame.column("a").unwrap();
        let p = parsed.frame.column("p").unwrap();
        let c = parsed.frame.column("c").unwrap();
        assert_eq!(a.get(0).unwrap(), AnyValue::Float64(0.0));
        assert_eq!(p.get(0).unwrap(), AnyValue::String("tcp"));
        assert_eq!(c.get(0).unwrap(), AnyValue::Float64(7.0));
        assert_eq!(a.get(1).unwrap(), AnyValue::Float64(1.5));
        assert_eq!(p.get(1).unwrap(), AnyValue::String("udp"));
    }

    #[test]
    fn test_row_capacity_ignores_padding() {
        let padded = format!(
            "@ATTRIBUTE a NUMERIC\n@DATA\n1\n{}% trailing note\n2\n",
            "\n   \n".repeat(1000)
        );
        assert_eq!(count_data_lines(&padded, 2), 2);

        let parsed = parse_strict(&padded).unwrap();
        assert_eq!(parsed.frame.height(), 2);
    }

    #[test]
    fn test_split_attribute_name() {
        assert_eq!(
            split_attribute_name("'a b' NUMERIC"),
            Some(("a b".to_string(), "NUMERIC"))
        );
        assert_eq!(
            split_attribute_name("flag   {SF, S0}"),
            Some(("flag".to_string(), "{SF, S0}"))
        );
        assert_eq!(split_attribute_name("lonely"), None);
    }
}

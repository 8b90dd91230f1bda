//! ARFF parsing.
//!
//! Three independent parsers turn raw ARFF text into a polars [`DataFrame`]:
//!
//! - [`parse_strict`] - a conforming ARFF reader (canonical upper-case types)
//! - [`parse_permissive`] - repairs attribute declarations, then parses strictly
//! - [`parse_nsl_kdd_fallback`] - ignores the header and applies the fixed
//!   42-column NSL-KDD schema to the rows after `@data`
//!
//! Each parser is a pure `&str -> Result<ParsedDataset, ArffError>` function;
//! the [`crate::loader`] module chains them.

mod fallback;
mod frame;
mod parser;
mod repair;
pub mod schema;

pub use fallback::parse_nsl_kdd_fallback;
pub use parser::parse_strict;
pub use repair::{AttributeRepairer, parse_permissive};

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Declared type of an ARFF attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    Real,
    Integer,
    String,
    Nominal(Vec<String>),
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "NUMERIC"),
            Self::Real => write!(f, "REAL"),
            Self::Integer => write!(f, "INTEGER"),
            Self::String => write!(f, "STRING"),
            Self::Nominal(values) => write!(f, "{{{}}}", values.join(",")),
        }
    }
}

/// A named, typed column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Output of a single parsing strategy.
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    /// Relation name from `@RELATION`, empty when absent.
    pub relation: String,
    /// Attribute declarations in column order.
    pub attributes: Vec<Attribute>,
    /// The parsed rows.
    pub frame: DataFrame,
    /// Rows skipped by the strategy's partial-recovery policy.
    pub dropped_rows: usize,
}

/// Why a single parsing strategy rejected the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArffError {
    #[error("empty dataset: the file contains no ARFF content")]
    EmptyDataset,

    #[error("no @DATA section found")]
    MissingDataSection,

    #[error("no @ATTRIBUTE declarations before @DATA")]
    NoAttributes,

    #[error("line {line}: unexpected content before @DATA: '{text}'")]
    UnexpectedLine { line: usize, text: String },

    #[error("line {line}: unknown directive '{directive}'")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: malformed attribute declaration: {reason}")]
    BadAttribute { line: usize, reason: String },

    #[error("line {line}: duplicate attribute '{name}'")]
    DuplicateAttribute { line: usize, name: String },

    #[error("line {line}: expected {expected} values, found {found}")]
    ArityMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: value '{value}' is not numeric (attribute '{attribute}')")]
    BadNumeric {
        line: usize,
        attribute: String,
        value: String,
    },

    #[error("line {line}: value '{value}' is not declared for nominal attribute '{attribute}'")]
    BadNominal {
        line: usize,
        attribute: String,
        value: String,
    },

    #[error("line {line}: malformed row: {reason}")]
    BadRow { line: usize, reason: String },

    #[error("no line matching the @data marker")]
    MissingDataMarker,

    #[error("no rows with {expected} fields after @data ({dropped} rows dropped)")]
    NoValidRows { expected: usize, dropped: usize },

    #[error("failed to build table: {0}")]
    Frame(String),

    #[error("out of memory: {0}")]
    ResourceExhausted(String),
}

impl From<std::collections::TryReserveError> for ArffError {
    fn from(err: std::collections::TryReserveError) -> Self {
        ArffError::ResourceExhausted(err.to_string())
    }
}

impl From<polars::error::PolarsError> for ArffError {
    fn from(err: polars::error::PolarsError) -> Self {
        ArffError::Frame(err.to_string())
    }
}

/// Split `line` on commas that are outside `'`/`"` quotes.
///
/// Returned pieces are untrimmed slices of `line`.
pub(crate) fn split_outside_quotes(line: &str) -> Result<Vec<&str>, String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (pos, ch) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                ',' => {
                    pieces.push(&line[start..pos]);
                    start = pos + 1;
                }
                _ => {}
            },
        }
    }

    if quote.is_some() {
        return Err("unterminated quoted value".to_string());
    }
    pieces.push(&line[start..]);
    Ok(pieces)
}

/// Trim a raw field and remove one pair of matching surrounding quotes,
/// resolving backslash escapes inside them.
///
/// Returns the value and whether it was quoted.
pub(crate) fn unquote(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if (open == '\'' || open == '"') && open == close => {
            let inner = &trimmed[1..trimmed.len() - 1];
            let mut value = String::with_capacity(inner.len());
            let mut escaped = false;
            for ch in inner.chars() {
                if escaped {
                    value.push(match ch {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else {
                    value.push(ch);
                }
            }
            (value, true)
        }
        _ => (trimmed.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_outside_quotes_keeps_quoted_commas() {
        let pieces = split_outside_quotes("0,'a,b', \"c\" ,d").unwrap();
        assert_eq!(pieces, vec!["0", "'a,b'", " \"c\" ", "d"]);
    }

    #[test]
    fn test_split_outside_quotes_detects_unterminated() {
        assert!(split_outside_quotes("1,'open").is_err());
    }

    #[test]
    fn test_unquote_variants() {
        assert_eq!(unquote("  tcp "), ("tcp".to_string(), false));
        assert_eq!(unquote("'a b'"), ("a b".to_string(), true));
        assert_eq!(unquote("\"it\\'s\""), ("it's".to_string(), true));
        assert_eq!(unquote("'"), ("'".to_string(), false));
    }

    #[test]
    fn test_attribute_kind_display() {
        assert_eq!(AttributeKind::Numeric.to_string(), "NUMERIC");
        let nominal = AttributeKind::Nominal(vec!["tcp".into(), "udp".into()]);
        assert_eq!(nominal.to_string(), "{tcp,udp}");
    }
}

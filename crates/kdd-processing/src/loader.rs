//! Fault-tolerant dataset loading.
//!
//! [`DatasetLoader`] tries each parsing strategy in order and returns the
//! first table that parses. The label column is then resolved against that
//! table; a missing label column is reported straight away rather than
//! handed to the next strategy.

use crate::arff::{
    ArffError, Attribute, ParsedDataset, parse_nsl_kdd_fallback, parse_permissive, parse_strict,
};
use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

// =============================================================================
// Strategies
// =============================================================================

/// Which parser produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Conforming ARFF.
    Strict,
    /// ARFF after attribute-declaration repair.
    Permissive,
    /// Header ignored; fixed NSL-KDD schema applied to the data rows.
    SchemaFallback,
}

impl LoadStrategy {
    /// Prefix used in aggregated failure messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
            Self::SchemaFallback => "fallback",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ParseFn = fn(&str) -> std::result::Result<ParsedDataset, ArffError>;

/// Strategies in escalation order.
const STRATEGIES: &[(LoadStrategy, ParseFn)] = &[
    (LoadStrategy::Strict, parse_strict),
    (LoadStrategy::Permissive, parse_permissive),
    (LoadStrategy::SchemaFallback, parse_nsl_kdd_fallback),
];

// =============================================================================
// Loader
// =============================================================================

/// A parsed table together with how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub relation: String,
    pub attributes: Vec<Attribute>,
    pub frame: DataFrame,
    pub strategy: LoadStrategy,
    pub dropped_rows: usize,
    /// Resolved name of the stratification column.
    pub label_column: String,
}

/// Runs the parsing strategies and resolves the label column.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetLoader;

impl DatasetLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw` with the first strategy that accepts it.
    ///
    /// Fails with [`ProcessingError::DatasetLoad`] carrying one reason per
    /// strategy when none succeeds. Allocation failures stop the chain with
    /// [`ProcessingError::ResourceExhausted`].
    pub fn load(&self, raw: &str, config: &ProcessingConfig) -> Result<LoadedDataset> {
        let mut attempts = Vec::with_capacity(STRATEGIES.len());

        for (strategy, parse) in STRATEGIES {
            let start = Instant::now();
            match parse(raw) {
                Ok(parsed) => {
                    info!(
                        strategy = %strategy,
                        rows = parsed.frame.height(),
                        columns = parsed.frame.width(),
                        dropped_rows = parsed.dropped_rows,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Dataset loaded"
                    );
                    let label_column = resolve_label_column(
                        &parsed.frame,
                        &config.label_column,
                        &config.label_keyword,
                    )?;
                    return Ok(LoadedDataset {
                        relation: parsed.relation,
                        attributes: parsed.attributes,
                        frame: parsed.frame,
                        strategy: *strategy,
                        dropped_rows: parsed.dropped_rows,
                        label_column,
                    });
                }
                Err(ArffError::ResourceExhausted(reason)) => {
                    return Err(ProcessingError::ResourceExhausted(reason));
                }
                Err(err) => {
                    debug!(strategy = %strategy, error = %err, "Load strategy failed");
                    attempts.push(format!("{strategy}: {err}"));
                }
            }
        }

        Err(ProcessingError::DatasetLoad { attempts })
    }
}

/// Find the stratification column.
///
/// Tries an exact match of `hint`, then a case-insensitive match, then the
/// first column whose lower-cased name contains `keyword`.
pub fn resolve_label_column(frame: &DataFrame, hint: &str, keyword: &str) -> Result<String> {
    let names: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    if names.iter().any(|name| name == hint) {
        return Ok(hint.to_string());
    }

    if let Some(name) = names.iter().find(|name| name.eq_ignore_ascii_case(hint)) {
        debug!(hint, column = %name, "Label column matched case-insensitively");
        return Ok(name.clone());
    }

    let keyword = keyword.to_lowercase();
    if let Some(name) = names.iter().find(|name| name.to_lowercase().contains(&keyword)) {
        info!(hint, column = %name, "Label column discovered by keyword");
        return Ok(name.clone());
    }

    Err(ProcessingError::LabelColumnNotFound {
        hint: hint.to_string(),
        available: names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn frame_with(columns: &[&str]) -> DataFrame {
        let columns: Vec<Column> = columns
            .iter()
            .map(|name| Column::new((*name).into(), &[1i64]))
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn test_resolve_label_exact_and_case_insensitive() {
        let df = frame_with(&["duration", "Protocol_Type"]);
        assert_eq!(
            resolve_label_column(&df, "Protocol_Type", "protocol").unwrap(),
            "Protocol_Type"
        );
        assert_eq!(
            resolve_label_column(&df, "protocol_type", "protocol").unwrap(),
            "Protocol_Type"
        );
    }

    #[test]
    fn test_resolve_label_by_keyword() {
        let df = frame_with(&["duration", "ip_protocol", "protocol_name"]);
        assert_eq!(
            resolve_label_column(&df, "protocol_type", "protocol").unwrap(),
            "ip_protocol"
        );
    }

    #[test]
    fn test_resolve_label_missing() {
        let df = frame_with(&["duration", "service"]);
        let err = resolve_label_column(&df, "protocol_type", "protocol").unwrap_err();
        match err {
            ProcessingError::LabelColumnNotFound { hint, available } => {
                assert_eq!(hint, "protocol_type");
                assert_eq!(available, vec!["duration", "service"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_reports_strategy() {
        let config = ProcessingConfig::default();
        let text = "@RELATION r\n@ATTRIBUTE duration NUMERIC\n@ATTRIBUTE protocol_type {tcp,udp}\n\
                    @DATA\n0,tcp\n1,udp\n";
        let loaded = DatasetLoader::new().load(text, &config).unwrap();
        assert_eq!(loaded.strategy, LoadStrategy::Strict);
        assert_eq!(loaded.label_column, "protocol_type");
        assert_eq!(loaded.frame.height(), 2);

        let repaired = text.replace("{tcp,udp}", "string");
        let loaded = DatasetLoader::new().load(&repaired, &config).unwrap();
        assert_eq!(loaded.strategy, LoadStrategy::Permissive);
    }

    #[test]
    fn test_load_fails_with_three_reasons() {
        let err = DatasetLoader::new()
            .load("not an arff file at all", &ProcessingConfig::default())
            .unwrap_err();
        match err {
            ProcessingError::DatasetLoad { attempts } => {
                assert_eq!(attempts.len(), 3);
                assert!(attempts[0].starts_with("strict: "));
                assert!(attempts[1].starts_with("permissive: "));
                assert!(attempts[2].starts_with("fallback: "));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_label_error_does_not_fall_through() {
        let text = "@ATTRIBUTE duration NUMERIC\n@DATA\n1\n";
        let err = DatasetLoader::new()
            .load(text, &ProcessingConfig::default())
            .unwrap_err();
        assert!(matches!(err, ProcessingError::LabelColumnNotFound { .. }));
    }
}

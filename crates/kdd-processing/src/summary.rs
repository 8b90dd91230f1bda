//! Split summaries and dataset description.

use crate::error::Result;
use crate::split::DatasetSplits;
use crate::types::{LabelFrequency, PerSplit};
use crate::utils::{column_as_strings, count_values, dtype_name, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Split Summary
// =============================================================================

/// Sizes and label frequencies of the three splits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub split_sizes: PerSplit<usize>,
    pub label_frequencies: PerSplit<LabelFrequency>,
    pub total_instances: usize,
    /// Number of columns other than the label column.
    pub feature_count: usize,
}

/// Count rows and label values of each split.
pub fn summarize(splits: &DatasetSplits, label_column: &str) -> Result<Summary> {
    let split_sizes = PerSplit {
        train: splits.train.height(),
        validation: splits.validation.height(),
        test: splits.test.height(),
    };
    let label_frequencies = splits.try_map_ref(|_, frame| label_frequency(frame, label_column))?;
    let total_instances = split_sizes.train + split_sizes.validation + split_sizes.test;

    let width = splits.train.width();
    let has_label = splits.train.column(label_column).is_ok();
    let feature_count = if has_label { width.saturating_sub(1) } else { width };

    Ok(Summary {
        split_sizes,
        label_frequencies,
        total_instances,
        feature_count,
    })
}

/// Value counts of `label_column` in one table.
pub fn label_frequency(frame: &DataFrame, label_column: &str) -> Result<LabelFrequency> {
    let values = column_as_strings(frame.column(label_column)?)?;
    Ok(LabelFrequency::from_counts(count_values(&values)))
}

// =============================================================================
// Dataset Description
// =============================================================================

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericDescription {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Shape, column types and numeric description of the loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// `(rows, columns)`.
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub description: Vec<NumericDescription>,
}

impl DatasetInfo {
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(frame.width());
        let mut dtypes = BTreeMap::new();
        let mut description = Vec::new();

        for column in frame.get_columns() {
            let name = column.name().to_string();
            dtypes.insert(name.clone(), dtype_name(column.dtype()));
            if is_numeric_dtype(column.dtype()) {
                description.push(describe_numeric(column)?);
            }
            columns.push(name);
        }

        Ok(Self {
            shape: frame.shape(),
            columns,
            dtypes,
            description,
        })
    }
}

fn describe_numeric(column: &Column) -> Result<NumericDescription> {
    let floats = column
        .as_materialized_series()
        .drop_nulls()
        .cast(&DataType::Float64)?;
    let mut values: Vec<f64> = floats.f64()?.into_iter().flatten().collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|mean| {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });

    Ok(NumericDescription {
        column: column.name().to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    })
}

/// Linearly interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_dataset_info_describes_numeric_columns() {
        let df = df!(
            "duration" => &[Some(1i64), Some(2), Some(3), Some(4), None],
            "protocol_type" => &["tcp", "udp", "tcp", "icmp", "tcp"]
        )
        .unwrap();
        let info = DatasetInfo::from_frame(&df).unwrap();
        assert_eq!(info.shape, (5, 2));
        assert_eq!(info.columns, vec!["duration", "protocol_type"]);
        assert_eq!(info.dtypes["duration"], "int64");
        assert_eq!(info.dtypes["protocol_type"], "object");
        assert_eq!(info.description.len(), 1);

        let duration = &info.description[0];
        assert_eq!(duration.count, 4);
        assert_eq!(duration.mean, Some(2.5));
        assert_eq!(duration.min, Some(1.0));
        assert_eq!(duration.median, Some(2.5));
        assert_eq!(duration.max, Some(4.0));
        let std = duration.std.unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["description"][0]["25%"], 1.75);
        assert_eq!(json["shape"], serde_json::json!([5, 2]));
    }

    #[test]
    fn test_summarize_counts_splits() {
        let splits = DatasetSplits {
            train: df!("x" => &[1, 2, 3], "protocol_type" => &["tcp", "tcp", "udp"]).unwrap(),
            validation: df!("x" => &[4], "protocol_type" => &["tcp"]).unwrap(),
            test: df!("x" => &[5], "protocol_type" => &["udp"]).unwrap(),
        };
        let summary = summarize(&splits, "protocol_type").unwrap();
        assert_eq!(summary.split_sizes.train, 3);
        assert_eq!(summary.total_instances, 5);
        assert_eq!(summary.feature_count, 1);
        assert_eq!(summary.label_frequencies.train.get("tcp"), 2);
        assert_eq!(summary.label_frequencies.test.get("udp"), 1);
    }
}

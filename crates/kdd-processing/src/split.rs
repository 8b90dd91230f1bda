//! Deterministic stratified splitting.
//!
//! [`stratified_split`] is a binary split that keeps the class proportions of
//! a label column on both sides. [`StratifiedSplitter`] applies it twice to
//! produce train / validation / test tables.

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::types::PerSplit;
use crate::utils::column_as_strings;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::debug;

/// Train, validation and test tables.
pub type DatasetSplits = PerSplit<DataFrame>;

/// Guards `ceil` against products such as `0.4 * 150 = 60.00000000000001`.
const FRACTION_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Binary split
// =============================================================================

/// Split `frame` into `(train, test)` keeping the label proportions.
///
/// The test side receives `ceil(test_fraction * rows)` rows. Each class is
/// apportioned to the train side by largest remainder, so per-class counts
/// never drift by more than one row from the exact proportion.
pub fn stratified_split(
    frame: &DataFrame,
    label_column: &str,
    test_fraction: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    let rows = frame.height();
    if rows == 0 {
        return Err(ProcessingError::EmptyDataset);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ProcessingError::InvalidConfig(format!(
            "test fraction {test_fraction} must be strictly between 0.0 and 1.0"
        )));
    }

    let labels = column_as_strings(frame.column(label_column)?)?;
    let missing = labels.iter().filter(|label| label.is_none()).count();
    if missing > 0 {
        return Err(ProcessingError::MissingLabels {
            column: label_column.to_string(),
            count: missing,
        });
    }

    let mut classes: BTreeMap<String, Vec<IdxSize>> = BTreeMap::new();
    for (idx, label) in labels.into_iter().enumerate() {
        if let Some(label) = label {
            classes.entry(label).or_default().push(idx as IdxSize);
        }
    }

    if let Some((label, members)) = classes.iter().min_by_key(|(_, members)| members.len())
        && members.len() < 2
    {
        return Err(ProcessingError::InsufficientClassMembers {
            column: label_column.to_string(),
            label: label.clone(),
            count: members.len(),
        });
    }

    let n_test = ((test_fraction * rows as f64) - FRACTION_TOLERANCE).ceil() as usize;
    let n_train = rows - n_test;
    if n_train < classes.len() || n_test < classes.len() {
        return Err(ProcessingError::SplitTooSmall {
            rows,
            classes: classes.len(),
            train: n_train,
            test: n_test,
        });
    }

    let train_counts = apportion(&classes, n_train, rows);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx: Vec<IdxSize> = Vec::with_capacity(n_train);
    let mut test_idx: Vec<IdxSize> = Vec::with_capacity(n_test);

    for (members, take) in classes.into_values().zip(train_counts) {
        let mut members = members;
        members.shuffle(&mut rng);
        let (train_part, test_part) = members.split_at(take);
        train_idx.extend_from_slice(train_part);
        test_idx.extend_from_slice(test_part);
    }
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    debug!(
        rows,
        train = train_idx.len(),
        test = test_idx.len(),
        seed,
        "Stratified split"
    );

    let train = frame.take(&IdxCa::from_vec("idx".into(), train_idx))?;
    let test = frame.take(&IdxCa::from_vec("idx".into(), test_idx))?;
    Ok((train, test))
}

/// Largest-remainder apportionment of `total` seats over the classes.
///
/// Ties on the remainder go to the larger class, then to the earlier label.
fn apportion(classes: &BTreeMap<String, Vec<IdxSize>>, total: usize, rows: usize) -> Vec<usize> {
    let sizes: Vec<usize> = classes.values().map(Vec::len).collect();
    let mut counts: Vec<usize> = sizes.iter().map(|size| size * total / rows).collect();
    let assigned: usize = counts.iter().sum();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let rem_a = sizes[a] * total % rows;
        let rem_b = sizes[b] * total % rows;
        rem_b
            .cmp(&rem_a)
            .then_with(|| sizes[b].cmp(&sizes[a]))
            .then_with(|| a.cmp(&b))
    });

    for &class in order.iter().take(total - assigned) {
        counts[class] += 1;
    }
    counts
}

// =============================================================================
// Three-way split
// =============================================================================

/// Two-stage train / validation / test splitter.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplitter {
    /// Fraction of all rows held out from training.
    pub holdout_fraction: f64,
    /// Fraction of the held-out rows that become the test split.
    pub test_share: f64,
    pub seed: u64,
}

impl Default for StratifiedSplitter {
    fn default() -> Self {
        Self::from_config(&ProcessingConfig::default())
    }
}

impl StratifiedSplitter {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            holdout_fraction: config.holdout_fraction,
            test_share: config.test_share,
            seed: config.seed,
        }
    }

    /// Split into train, validation and test, both stages using the same seed.
    pub fn split(&self, frame: &DataFrame, label_column: &str) -> Result<DatasetSplits> {
        let (train, holdout) =
            stratified_split(frame, label_column, self.holdout_fraction, self.seed)
                .context("Splitting training rows from held-out rows")?;
        let (validation, test) = stratified_split(&holdout, label_column, self.test_share, self.seed)
            .context("Splitting held-out rows into validation and test")?;

        Ok(DatasetSplits {
            train,
            validation,
            test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(counts: &[(&str, usize)]) -> DataFrame {
        let mut labels = Vec::new();
        for (label, count) in counts {
            labels.extend(std::iter::repeat_n(*label, *count));
        }
        let ids: Vec<i64> = (0..labels.len() as i64).collect();
        df!("id" => ids, "protocol_type" => labels).unwrap()
    }

    fn count_of(frame: &DataFrame, label: &str) -> usize {
        column_as_strings(frame.column("protocol_type").unwrap())
            .unwrap()
            .iter()
            .filter(|value| value.as_deref() == Some(label))
            .count()
    }

    #[test]
    fn test_binary_split_sizes_and_proportions() {
        let df = labelled(&[("tcp", 100), ("udp", 30), ("icmp", 20)]);
        let (train, test) = stratified_split(&df, "protocol_type", 0.4, 42).unwrap();
        assert_eq!(train.height(), 90);
        assert_eq!(test.height(), 60);
        assert_eq!(count_of(&train, "tcp"), 60);
        assert_eq!(count_of(&test, "udp"), 12);
        assert_eq!(count_of(&test, "icmp"), 8);
    }

    #[test]
    fn test_binary_split_is_deterministic() {
        let df = labelled(&[("tcp", 10), ("udp", 6)]);
        let (a, _) = stratified_split(&df, "protocol_type", 0.25, 7).unwrap();
        let (b, _) = stratified_split(&df, "protocol_type", 0.25, 7).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_single_member_class_is_rejected() {
        let df = labelled(&[("tcp", 10), ("icmp", 1)]);
        let err = stratified_split(&df, "protocol_type", 0.4, 42).unwrap_err();
        match err {
            ProcessingError::InsufficientClassMembers { label, count, .. } => {
                assert_eq!(label, "icmp");
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_split_too_small() {
        let df = labelled(&[("a", 2), ("b", 2), ("c", 2)]);
        let err = stratified_split(&df, "protocol_type", 0.2, 42).unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::SplitTooSmall {
                rows: 6,
                classes: 3,
                train: 4,
                test: 2
            }
        ));
    }

    #[test]
    fn test_empty_and_null_labels() {
        let empty = labelled(&[]);
        assert!(matches!(
            stratified_split(&empty, "protocol_type", 0.4, 42).unwrap_err(),
            ProcessingError::EmptyDataset
        ));

        let df = df!("protocol_type" => &[Some("tcp"), None, Some("tcp")]).unwrap();
        assert!(matches!(
            stratified_split(&df, "protocol_type", 0.4, 42).unwrap_err(),
            ProcessingError::MissingLabels { count: 1, .. }
        ));
    }

    #[test]
    fn test_apportion_breaks_ties_by_class_size() {
        let mut classes: BTreeMap<String, Vec<IdxSize>> = BTreeMap::new();
        classes.insert("a".to_string(), vec![0; 3]);
        classes.insert("b".to_string(), vec![0; 5]);
        // 8 rows, 4 seats: exact quotas 1.5 and 2.5, one spare seat goes to "b".
        assert_eq!(apportion(&classes, 4, 8), vec![1, 3]);
    }

    #[test]
    fn test_three_way_split() {
        let df = labelled(&[("tcp", 100), ("udp", 30), ("icmp", 20)]);
        let splits = StratifiedSplitter::default()
            .split(&df, "protocol_type")
            .unwrap();
        assert_eq!(splits.train.height(), 90);
        assert_eq!(splits.validation.height(), 30);
        assert_eq!(splits.test.height(), 30);
        assert_eq!(count_of(&splits.validation, "tcp"), 20);
        assert_eq!(count_of(&splits.test, "udp"), 6);
        assert_eq!(count_of(&splits.test, "icmp"), 4);
    }
}

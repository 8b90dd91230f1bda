//! End-to-end processing of one uploaded dataset.
//!
//! [`DatasetProcessor`] runs load → describe → split → summarize → render and
//! assembles the [`ProcessingReport`] returned to clients. Intermediate
//! values are dropped as soon as their last consumer has run.

use crate::config::ProcessingConfig;
use crate::error::{Result, ResultExt};
use crate::histogram::HistogramRenderer;
use crate::loader::{DatasetLoader, LoadStrategy};
use crate::split::{DatasetSplits, StratifiedSplitter};
use crate::summary::{DatasetInfo, summarize};
use crate::types::{LabelFrequency, PerSplit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Response payload of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingReport {
    pub split_sizes: PerSplit<usize>,
    /// Label value counts per split, most frequent first.
    pub protocol_type_distribution: PerSplit<LabelFrequency>,
    /// Base64-encoded PNG per split; empty when rendering failed.
    pub histograms: PerSplit<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_info: Option<DatasetInfo>,
    pub label_column: String,
    pub load_strategy: LoadStrategy,
    pub dropped_rows: usize,
    pub total_instances: usize,
    pub feature_count: usize,
}

/// Runs the processing stages for one dataset.
#[derive(Debug, Clone)]
pub struct DatasetProcessor {
    config: ProcessingConfig,
    loader: DatasetLoader,
    splitter: StratifiedSplitter,
    renderer: HistogramRenderer,
}

static_assertions::assert_impl_all!(DatasetProcessor: Send, Sync);
static_assertions::assert_impl_all!(ProcessingReport: Send, Sync);

impl DatasetProcessor {
    /// Create a processor, validating `config` first.
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            loader: DatasetLoader::new(),
            splitter: StratifiedSplitter::from_config(&config),
            renderer: HistogramRenderer::new(config.histogram),
            config,
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process raw ARFF text into a report.
    pub fn process(&self, raw: String) -> Result<ProcessingReport> {
        let (report, splits) = self.process_with_splits(raw)?;
        drop(splits);
        Ok(report)
    }

    /// Like [`DatasetProcessor::process`], but also hands back the split tables.
    pub fn process_with_splits(&self, raw: String) -> Result<(ProcessingReport, DatasetSplits)> {
        let started = Instant::now();
        info!(bytes = raw.len(), "Processing dataset");

        // Step 1: parse
        let stage = Instant::now();
        let loaded = self.loader.load(&raw, &self.config)?;
        drop(raw);
        info!(
            strategy = %loaded.strategy,
            rows = loaded.frame.height(),
            columns = loaded.frame.width(),
            label_column = %loaded.label_column,
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "Step 1: dataset loaded"
        );

        // Step 2: describe
        let dataset_info = if self.config.include_dataset_info {
            let stage = Instant::now();
            let info = DatasetInfo::from_frame(&loaded.frame).context("Describing dataset")?;
            info!(
                numeric_columns = info.description.len(),
                elapsed_ms = stage.elapsed().as_millis() as u64,
                "Step 2: dataset described"
            );
            Some(info)
        } else {
            None
        };

        // Step 3: split
        let stage = Instant::now();
        let splits = self.splitter.split(&loaded.frame, &loaded.label_column)?;
        let label_column = loaded.label_column;
        let load_strategy = loaded.strategy;
        let dropped_rows = loaded.dropped_rows;
        drop(loaded.frame);
        info!(
            train = splits.train.height(),
            validation = splits.validation.height(),
            test = splits.test.height(),
            seed = self.splitter.seed,
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "Step 3: dataset split"
        );

        // Step 4: summarize
        let summary = summarize(&splits, &label_column).context("Summarizing splits")?;

        // Step 5: render
        let stage = Instant::now();
        let histograms = PerSplit {
            train: &splits.train,
            validation: &splits.validation,
            test: &splits.test,
        }
        .map(|kind, frame| {
            STANDARD.encode(self.renderer.render_or_empty(kind, frame, &label_column))
        });
        info!(
            elapsed_ms = stage.elapsed().as_millis() as u64,
            "Step 5: histograms rendered"
        );

        info!(
            total_instances = summary.total_instances,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dataset processing complete"
        );

        let report = ProcessingReport {
            split_sizes: summary.split_sizes,
            protocol_type_distribution: summary.label_frequencies,
            histograms,
            dataset_info,
            label_column,
            load_strategy,
            dropped_rows,
            total_instances: summary.total_instances,
            feature_count: summary.feature_count,
        };
        Ok((report, splits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;

    fn small_arff() -> String {
        let mut text = String::from(
            "@RELATION kdd\n@ATTRIBUTE duration NUMERIC\n@ATTRIBUTE protocol_type {tcp,udp}\n@DATA\n",
        );
        for i in 0..10 {
            let label = if i < 6 { "tcp" } else { "udp" };
            text.push_str(&format!("{i},{label}\n"));
        }
        text
    }

    #[test]
    fn test_process_builds_report() {
        let processor = DatasetProcessor::new(ProcessingConfig::default()).unwrap();
        let report = processor.process(small_arff()).unwrap();

        assert_eq!(report.split_sizes.train, 6);
        assert_eq!(report.split_sizes.validation, 2);
        assert_eq!(report.split_sizes.test, 2);
        assert_eq!(report.total_instances, 10);
        assert_eq!(report.feature_count, 1);
        assert_eq!(report.load_strategy, LoadStrategy::Strict);
        assert!(report.dataset_info.is_some());
        assert!(!report.histograms.train.is_empty());
        assert!(STANDARD.decode(&report.histograms.test).is_ok());
    }

    #[test]
    fn test_dataset_info_can_be_disabled() {
        let config = ProcessingConfig::builder()
            .include_dataset_info(false)
            .build()
            .unwrap();
        let report = DatasetProcessor::new(config)
            .unwrap()
            .process(small_arff())
            .unwrap();
        assert!(report.dataset_info.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("dataset_info").is_none());
        assert_eq!(json["load_strategy"], "strict");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProcessingConfig {
            holdout_fraction: 1.5,
            ..ProcessingConfig::default()
        };
        let err = DatasetProcessor::new(config).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidConfig(_)));
    }
}

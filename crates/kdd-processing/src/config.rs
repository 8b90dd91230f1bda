//! Configuration types for the dataset processing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};

/// Default stratification column of the NSL-KDD family.
pub const DEFAULT_LABEL_COLUMN: &str = "protocol_type";

/// Keyword used to discover the label column when the hint is absent.
pub const DEFAULT_LABEL_KEYWORD: &str = "protocol";

/// Seed shared by both stages of the three-way split.
pub const DEFAULT_SEED: u64 = 42;

/// Canvas settings for the per-split histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Image width in pixels. Default: 640 (8 in at 80 dpi)
    pub width: u32,
    /// Image height in pixels. Default: 320 (4 in at 80 dpi)
    pub height: u32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 320,
        }
    }
}

/// Configuration for the processing pipeline.
///
/// Use [`ProcessingConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use kdd_processing::config::ProcessingConfig;
///
/// let config = ProcessingConfig::builder()
///     .label_column("protocol_type")
///     .seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Preferred label column used for stratification and histograms.
    /// Default: "protocol_type"
    pub label_column: String,

    /// Case-insensitive substring used to discover the label column when
    /// `label_column` is not present in the dataset.
    /// Default: "protocol"
    pub label_keyword: String,

    /// Seed for both stratified split stages.
    /// Default: 42
    pub seed: u64,

    /// Fraction of rows held out from training in the first stage (0.0 - 1.0, exclusive).
    /// Default: 0.4
    pub holdout_fraction: f64,

    /// Fraction of the held-out rows that become the test split (0.0 - 1.0, exclusive).
    /// The remainder becomes the validation split.
    /// Default: 0.5
    pub test_share: f64,

    /// Whether to compute shape, dtypes and numeric description of the loaded table.
    /// Default: true
    pub include_dataset_info: bool,

    /// Histogram canvas settings.
    pub histogram: HistogramConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            label_keyword: DEFAULT_LABEL_KEYWORD.to_string(),
            seed: DEFAULT_SEED,
            holdout_fraction: 0.4,
            test_share: 0.5,
            include_dataset_info: true,
            histogram: HistogramConfig::default(),
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.label_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("label_column".to_string()));
        }

        if self.label_keyword.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("label_keyword".to_string()));
        }

        for (field, value) in [
            ("holdout_fraction", self.holdout_fraction),
            ("test_share", self.test_share),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigValidationError::InvalidFraction {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.histogram.width < 64 || self.histogram.height < 64 {
            return Err(ConfigValidationError::InvalidCanvas {
                width: self.histogram.width,
                height: self.histogram.height,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("Field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Invalid histogram canvas {width}x{height} (each side must be at least 64 px)")]
    InvalidCanvas { width: u32, height: u32 },
}

impl From<ConfigValidationError> for crate::error::ProcessingError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ProcessingError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ProcessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    label_column: Option<String>,
    label_keyword: Option<String>,
    seed: Option<u64>,
    holdout_fraction: Option<f64>,
    test_share: Option<f64>,
    include_dataset_info: Option<bool>,
    histogram: Option<HistogramConfig>,
}

impl ProcessingConfigBuilder {
    /// Set the preferred label column.
    pub fn label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = Some(column.into());
        self
    }

    /// Set the keyword used to discover the label column.
    pub fn label_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.label_keyword = Some(keyword.into());
        self
    }

    /// Set the split seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fraction of rows held out from training.
    ///
    /// # Arguments
    /// * `fraction` - Value strictly between 0.0 and 1.0 (e.g., 0.4 = 40%)
    pub fn holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = Some(fraction);
        self
    }

    /// Set the share of held-out rows that become the test split.
    pub fn test_share(mut self, share: f64) -> Self {
        self.test_share = Some(share);
        self
    }

    /// Enable or disable the dataset info section.
    pub fn include_dataset_info(mut self, include: bool) -> Self {
        self.include_dataset_info = Some(include);
        self
    }

    /// Set the histogram canvas size.
    pub fn histogram_size(mut self, width: u32, height: u32) -> Self {
        self.histogram = Some(HistogramConfig { width, height });
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessingConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProcessingConfig, ConfigValidationError> {
        let defaults = ProcessingConfig::default();
        let config = ProcessingConfig {
            label_column: self.label_column.unwrap_or(defaults.label_column),
            label_keyword: self.label_keyword.unwrap_or(defaults.label_keyword),
            seed: self.seed.unwrap_or(defaults.seed),
            holdout_fraction: self.holdout_fraction.unwrap_or(defaults.holdout_fraction),
            test_share: self.test_share.unwrap_or(defaults.test_share),
            include_dataset_info: self
                .include_dataset_info
                .unwrap_or(defaults.include_dataset_info),
            histogram: self.histogram.unwrap_or(defaults.histogram),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.label_column, "protocol_type");
        assert_eq!(config.label_keyword, "protocol");
        assert_eq!(config.seed, 42);
        assert_eq!(config.holdout_fraction, 0.4);
        assert_eq!(config.test_share, 0.5);
        assert!(config.include_dataset_info);
        assert_eq!(config.histogram, HistogramConfig { width: 640, height: 320 });
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ProcessingConfig::builder()
            .label_column("class")
            .seed(7)
            .holdout_fraction(0.3)
            .include_dataset_info(false)
            .histogram_size(320, 160)
            .build()
            .unwrap();

        assert_eq!(config.label_column, "class");
        assert_eq!(config.seed, 7);
        assert_eq!(config.holdout_fraction, 0.3);
        assert!(!config.include_dataset_info);
        assert_eq!(config.histogram.width, 320);
    }

    #[test]
    fn test_validation_rejects_bad_fraction() {
        let result = ProcessingConfig::builder().holdout_fraction(1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidFraction { .. }
        ));

        let result = ProcessingConfig::builder().test_share(0.0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_label() {
        let result = ProcessingConfig::builder().label_column("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyField(_)
        ));
    }

    #[test]
    fn test_validation_rejects_tiny_canvas() {
        let result = ProcessingConfig::builder().histogram_size(10, 400).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCanvas { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "label_column": "service",
            "label_keyword": "serv",
            "seed": 1,
            "holdout_fraction": 0.2,
            "test_share": 0.5,
            "include_dataset_info": false,
            "histogram": { "width": 400, "height": 200 }
        }"#;

        let config: ProcessingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.label_column, "service");
        assert_eq!(config.seed, 1);
        assert_eq!(config.histogram.height, 200);
        assert!(config.validate().is_ok());
    }
}

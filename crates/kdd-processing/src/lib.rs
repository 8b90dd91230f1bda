//! NSL-KDD Dataset Processing Library
//!
//! Fault-tolerant ARFF ingestion and deterministic stratified splitting for
//! network-intrusion datasets of the NSL-KDD family, built on Polars.
//!
//! # Overview
//!
//! - **Layered ARFF loading**: strict parse, then a permissive parse that
//!   repairs attribute declarations, then a header-less parse that applies the
//!   fixed 42-column NSL-KDD schema
//! - **Label resolution**: exact, case-insensitive, or keyword match of the
//!   stratification column
//! - **Stratified splitting**: 60% / 20% / 20% train, validation and test
//!   splits that keep the label proportions
//! - **Summaries**: split sizes, per-split label frequencies and a numeric
//!   description of the loaded table
//! - **Histograms**: one PNG bar chart of label frequencies per split
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kdd_processing::{DatasetProcessor, ProcessingConfig};
//!
//! let raw = std::fs::read_to_string("KDDTrain+.arff")?;
//! let processor = DatasetProcessor::new(ProcessingConfig::default())?;
//! let report = processor.process(raw)?;
//!
//! println!("Loaded with {} strategy", report.load_strategy);
//! println!("Train rows: {}", report.split_sizes.train);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use kdd_processing::ProcessingConfig;
//!
//! let config = ProcessingConfig::builder()
//!     .label_column("protocol_type")  // preferred stratification column
//!     .seed(42)                       // shared by both split stages
//!     .holdout_fraction(0.4)          // 40% leaves the training split
//!     .test_share(0.5)                // half of that becomes the test split
//!     .histogram_size(640, 320)
//!     .build()?;
//! ```
//!
//! # Individual stages
//!
//! Every stage is usable on its own:
//!
//! ```rust,ignore
//! use kdd_processing::{DatasetLoader, StratifiedSplitter, summarize};
//!
//! let loaded = DatasetLoader::new().load(&raw, &config)?;
//! let splits = StratifiedSplitter::from_config(&config).split(&loaded.frame, &loaded.label_column)?;
//! let summary = summarize(&splits, &loaded.label_column)?;
//! ```

pub mod arff;
pub mod config;
pub mod error;
pub mod histogram;
pub mod loader;
pub mod pipeline;
pub mod split;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use arff::{ArffError, Attribute, AttributeKind, ParsedDataset};
pub use config::{ConfigValidationError, HistogramConfig, ProcessingConfig, ProcessingConfigBuilder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use histogram::HistogramRenderer;
pub use loader::{DatasetLoader, LoadStrategy, LoadedDataset, resolve_label_column};
pub use pipeline::{DatasetProcessor, ProcessingReport};
pub use split::{DatasetSplits, StratifiedSplitter, stratified_split};
pub use summary::{DatasetInfo, NumericDescription, Summary, summarize};
pub use types::{LabelFrequency, PerSplit, Scalar, SplitKind};

//! Mode-seeking clustering of (address, value) samples over a 1-D KDE.
//!
//! This crate provides tools for:
//! - Loading space-delimited sample files and estimator output
//! - Running an external kernel density estimator through its file contract
//! - Joining density estimates back onto the samples
//! - Labelling clusters with a trailing rolling maximum of the density curve
//!
//! # Example
//!
//! ```no_run
//! use kde_cluster::{processors::pipeline, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.clustering.window_size = 25;
//! let report = pipeline::run(&config).unwrap();
//! println!("{} cluster levels", report.summary.num_clusters());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{ClusteringConfig, EstimatorConfig, IoConfig, LeadingFill, PipelineConfig, PlotConfig};
pub use crate::core::loaders::{DensityPoint, Sample};
pub use crate::core::writers::ScanRecord;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

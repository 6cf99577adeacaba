//! Data processing modules.

pub mod clustering;
pub mod estimator;
pub mod merge;
pub mod pipeline;
pub mod rolling;

// Re-export key types for convenience
pub use clustering::{assign_clusters, summarize, ClusterLevel, ClusterSummary};
pub use estimator::{DensityEstimator, EstimatorError, ExternalEstimator};
pub use merge::{merge_density, MergeOutcome, MergedRow};
pub use pipeline::{run, run_with_estimator, PipelineReport};
pub use rolling::{rolling_max, window_max};

//! Core data types and I/O operations.

pub mod loaders;
pub mod writers;

pub use loaders::{load_density, load_samples, DensityPoint, LoaderError, Sample};
pub use writers::{write_estimator_input, write_scan, ScanRecord, WriteError};

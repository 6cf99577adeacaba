//! Join estimator output back onto the samples it was computed from.

use std::collections::HashMap;

use crate::core::loaders::{DensityPoint, Sample};

/// A sample paired with its density estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub index: usize,
    pub address: String,
    pub value: f64,
    pub kde: f64,
}

/// Result of [`merge_density`].
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Joined rows in sample order.
    pub rows: Vec<MergedRow>,
    /// Samples with no density row.
    pub unmatched_samples: usize,
    /// Density rows whose index matches no sample.
    pub unmatched_density: usize,
    /// Density rows ignored because their index was already seen.
    pub duplicate_density: usize,
}

/// Inner join of samples and densities on index.
///
/// Output follows sample order. When the estimator reports an index more than
/// once the first occurrence wins.
pub fn merge_density(samples: &[Sample], density: &[DensityPoint]) -> MergeOutcome {
    let mut by_index: HashMap<usize, f64> = HashMap::with_capacity(density.len());
    let mut duplicate_density = 0;

    for point in density {
        if by_index.contains_key(&point.index) {
            duplicate_density += 1;
        } else {
            by_index.insert(point.index, point.kde);
        }
    }

    let mut rows = Vec::with_capacity(samples.len().min(by_index.len()));
    let mut unmatched_samples = 0;

    for sample in samples {
        match by_index.get(&sample.index) {
            Some(&kde) => rows.push(MergedRow {
                index: sample.index,
                address: sample.address.clone(),
                value: sample.value,
                kde,
            }),
            None => unmatched_samples += 1,
        }
    }

    let unmatched_density = by_index.len().saturating_sub(rows.len());

    if unmatched_samples > 0 {
        log::warn!("{} samples have no density estimate and were dropped", unmatched_samples);
    }
    if unmatched_density > 0 {
        log::warn!("{} density rows match no sample and were ignored", unmatched_density);
    }
    if duplicate_density > 0 {
        log::warn!(
            "{} duplicate density indices ignored (first occurrence kept)",
            duplicate_density
        );
    }

    MergeOutcome {
        rows,
        unmatched_samples,
        unmatched_density,
        duplicate_density,
    }
}

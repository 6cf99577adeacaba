//! Mode-seeking cluster assignment over a KDE curve.
//!
//! Every row is labelled with the maximum density found in the trailing
//! window ending at that row. Runs of rows sharing a label sit under the same
//! local maximum of the curve; that maximum is the cluster center.
//!
//! # Example
//!
//! ```
//! use kde_cluster::config::ClusteringConfig;
//! use kde_cluster::processors::clustering::assign_clusters;
//! use kde_cluster::processors::merge::MergedRow;
//!
//! let rows: Vec<MergedRow> = [0.1, 0.4, 0.2, 0.1]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &kde)| MergedRow { index: i, address: i.to_string(), value: 1.0, kde })
//!     .collect();
//! let config = ClusteringConfig { window_size: 2, ..Default::default() };
//! let records = assign_clusters(&rows, &config);
//! assert_eq!(records[2].cluster, 0.4);
//! ```

use std::collections::HashMap;

use crate::config::{ClusteringConfig, LeadingFill};
use crate::core::writers::ScanRecord;

use super::merge::MergedRow;
use super::rolling::{rolling_max, window_max};

/// One distinct cluster level found in a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLevel {
    /// Label value shared by the members.
    pub level: f64,
    /// Number of rows carrying this label.
    pub members: usize,
    /// Index of the first sample whose density equals the level.
    pub center: Option<usize>,
}

/// Per-scan cluster statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSummary {
    pub rows: usize,
    /// Levels in order of first appearance.
    pub clusters: Vec<ClusterLevel>,
}

impl ClusterSummary {
    /// Number of distinct cluster levels.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }
}

/// Value given to rows before the first complete window.
fn leading_fill_value(rows: &[MergedRow], config: &ClusteringConfig) -> f64 {
    let source: Vec<f64> = match config.leading_fill {
        LeadingFill::ValueMax => rows.iter().map(|r| r.value).collect(),
        LeadingFill::KdeMax => rows.iter().map(|r| r.kde).collect(),
    };
    window_max(&source, config.window_size).unwrap_or(f64::NAN)
}

/// Label each merged row with the rolling maximum of its density.
///
/// Rows with no rolling maximum (the leading `window_size - 1` rows, and any
/// window touching a NaN density) receive the leading fill value.
pub fn assign_clusters(rows: &[MergedRow], config: &ClusteringConfig) -> Vec<ScanRecord> {
    if rows.is_empty() {
        return Vec::new();
    }

    let kde: Vec<f64> = rows.iter().map(|r| r.kde).collect();
    let rolled = rolling_max(&kde, config.window_size);
    let fill = leading_fill_value(rows, config);

    log::debug!(
        "rolling max over {} rows (window={}, leading fill={})",
        rows.len(),
        config.window_size,
        fill
    );

    rows.iter()
        .zip(rolled)
        .map(|(row, cluster)| ScanRecord {
            index: row.index,
            address: row.address.clone(),
            value: row.value,
            kde: row.kde,
            cluster: cluster.unwrap_or(fill),
        })
        .collect()
}

/// Hash key for a float. -0.0 and every NaN payload collapse onto one key.
fn level_key(x: f64) -> u64 {
    if x == 0.0 {
        0.0f64.to_bits()
    } else if x.is_nan() {
        f64::NAN.to_bits()
    } else {
        x.to_bits()
    }
}

/// Group scan records by cluster level.
///
/// Single pass over the records; a NaN level groups its rows but never has a
/// center.
pub fn summarize(records: &[ScanRecord]) -> ClusterSummary {
    let mut position: HashMap<u64, usize> = HashMap::new();
    let mut first_with_kde: HashMap<u64, usize> = HashMap::new();
    let mut clusters: Vec<ClusterLevel> = Vec::new();

    for record in records {
        if !record.kde.is_nan() {
            first_with_kde
                .entry(level_key(record.kde))
                .or_insert(record.index);
        }

        let slot = *position.entry(level_key(record.cluster)).or_insert_with(|| {
            clusters.push(ClusterLevel {
                level: record.cluster,
                members: 0,
                center: None,
            });
            clusters.len() - 1
        });
        clusters[slot].members += 1;
    }

    for cluster in clusters.iter_mut().filter(|c| !c.level.is_nan()) {
        cluster.center = first_with_kde.get(&level_key(cluster.level)).copied();
    }

    ClusterSummary {
        rows: records.len(),
        clusters,
    }
}

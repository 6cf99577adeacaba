//! End-to-end scan: load, estimate, merge, cluster, write.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::core::loaders::load_samples;
use crate::core::writers::write_scan;
use crate::visualization::plot_scan;

use super::clustering::{assign_clusters, summarize, ClusterSummary};
use super::estimator::{DensityEstimator, ExternalEstimator};
use super::merge::merge_density;

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Samples read from the input file.
    pub samples: usize,
    /// Density estimates returned by the estimator.
    pub estimates: usize,
    /// Rows that survived the join and were written.
    pub merged: usize,
    pub summary: ClusterSummary,
    pub output: PathBuf,
    pub plot: Option<PathBuf>,
}

/// Run the full scan with the configured external estimator.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, or if any stage fails.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let estimator = ExternalEstimator::from_config(&config.estimator);
    run_with_estimator(config, &estimator)
}

/// Run the full scan with any density estimator.
pub fn run_with_estimator<E: DensityEstimator + ?Sized>(
    config: &PipelineConfig,
    estimator: &E,
) -> Result<PipelineReport> {
    config.validate().context("invalid configuration")?;

    let input = &config.io.input;
    let samples = load_samples(input)
        .with_context(|| format!("failed to load samples from {}", input.display()))?;
    log::info!("{}: loaded {} samples", input.display(), samples.len());

    let density = if samples.is_empty() {
        log::warn!("{}: no samples, skipping density estimation", input.display());
        Vec::new()
    } else {
        estimator
            .estimate(&samples)
            .context("density estimation failed")?
    };

    let merged = merge_density(&samples, &density);
    log::info!(
        "merged {} of {} samples with density estimates",
        merged.rows.len(),
        samples.len()
    );

    let records = assign_clusters(&merged.rows, &config.clustering);
    let summary = summarize(&records);
    log::info!(
        "{} rows in {} cluster levels (window={})",
        summary.rows,
        summary.num_clusters(),
        config.clustering.window_size
    );
    for cluster in &summary.clusters {
        log::debug!(
            "level {} -> {} rows, center {:?}",
            cluster.level,
            cluster.members,
            cluster.center
        );
    }

    let output = &config.io.output;
    write_scan(output, &records)
        .with_context(|| format!("failed to write scan to {}", output.display()))?;
    log::info!("Scan CSV -> {}", output.display());

    let plot = match &config.io.plot {
        Some(path) if !records.is_empty() => {
            plot_scan(path, &records, &config.plot)
                .with_context(|| format!("failed to plot scan to {}", path.display()))?;
            log::info!("Scan plot -> {}", path.display());
            Some(path.clone())
        }
        Some(path) => {
            log::warn!("nothing to plot, skipping {}", path.display());
            None
        }
        None => None,
    };

    Ok(PipelineReport {
        samples: samples.len(),
        estimates: density.len(),
        merged: merged.rows.len(),
        summary,
        output: output.clone(),
        plot,
    })
}

//! Visualization of KDE scans.
//!
//! Renders the density curve and the cluster level curve against sample
//! index as a PNG using the plotters bitmap backend. No text is drawn so no
//! font backend is needed.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::writers::ScanRecord;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty scan")]
    EmptyScan,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Density curve color.
const KDE_COLOR: RGBColor = RGBColor(55, 126, 184);

/// Cluster level (rolling maximum) color.
const CLUSTER_COLOR: RGBColor = RGBColor(228, 26, 28);

/// Marker color for rows sitting on their own cluster level.
const CENTER_COLOR: RGBColor = RGBColor(77, 175, 74);

/// Plot a scan as two curves over sample index and save as PNG.
///
/// Non-finite values are left out of the curves. Rows whose density equals
/// their cluster level (the local maxima) are marked.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `records` - Scan records in output order
/// * `config` - Image dimensions
pub fn plot_scan(output_path: &Path, records: &[ScanRecord], config: &PlotConfig) -> Result<()> {
    if records.is_empty() {
        return Err(VisualizationError::EmptyScan);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let kde_points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.index as f64, r.kde))
        .filter(|(_, y)| y.is_finite())
        .collect();
    let cluster_points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.index as f64, r.cluster))
        .filter(|(_, y)| y.is_finite())
        .collect();
    let centers: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.kde.is_finite() && r.kde == r.cluster)
        .map(|r| (r.index as f64, r.kde))
        .collect();

    let (x_min, x_max, y_min, y_max) =
        compute_bounds(kde_points.iter().chain(cluster_points.iter()));
    let x_padding = (x_max - x_min) * 0.02;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();

    root.fill(&WHITE).map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(kde_points, &KDE_COLOR))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(cluster_points, CLUSTER_COLOR.stroke_width(2)))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(
            centers
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, CENTER_COLOR.filled())),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present().map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Compute the bounds (min/max) for x and y coordinates.
fn compute_bounds<'a, I>(points: I) -> (f64, f64, f64, f64)
where
    I: Iterator<Item = &'a (f64, f64)>,
{
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if x_min > x_max {
        (x_min, x_max) = (0.0, 1.0);
    }
    if y_min > y_max {
        (y_min, y_max) = (0.0, 1.0);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

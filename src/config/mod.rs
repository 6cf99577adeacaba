//! Configuration types for the KDE clustering pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by [`PipelineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window_size must be at least 1")]
    ZeroWindow,

    #[error("estimator binary path is empty")]
    EmptyBinary,

    #[error("plot dimensions must be non-zero, got {width}x{height}")]
    ZeroPlotSize { width: u32, height: u32 },
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Sample points (`<address> <value>` per line)
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Scan output (`<index> <address> <value> <kde> <cluster>` per line)
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Optional PNG rendering of the scan
    #[serde(default)]
    pub plot: Option<PathBuf>,
}

fn default_input() -> PathBuf {
    PathBuf::from("kde_in.csv")
}

fn default_output() -> PathBuf {
    PathBuf::from("kde_scan.csv")
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            plot: None,
        }
    }
}

/// How the external density estimator is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Path to the estimator executable
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Extra arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory the estimator runs in (it reads and writes fixed file names there)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Run inside a fresh temporary directory instead of `work_dir`
    #[serde(default)]
    pub isolate: bool,

    /// Leave the exchange files behind after a successful run
    #[serde(default = "default_keep_intermediate")]
    pub keep_intermediate: bool,

    /// File the estimator reads samples from
    #[serde(default = "default_input_name")]
    pub input_name: String,

    /// File the estimator writes densities to
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

fn default_binary() -> PathBuf {
    PathBuf::from("./kde_1d")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_keep_intermediate() -> bool {
    true
}

fn default_input_name() -> String {
    "file.csv".to_string()
}

fn default_output_name() -> String {
    "result.csv".to_string()
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: Vec::new(),
            work_dir: default_work_dir(),
            isolate: false,
            keep_intermediate: default_keep_intermediate(),
            input_name: default_input_name(),
            output_name: default_output_name(),
        }
    }
}

/// Value used for the leading rows that have no complete window yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LeadingFill {
    /// Maximum sample value over the first window
    #[default]
    ValueMax,
    /// Maximum density over the first window
    KdeMax,
}

/// Configuration for rolling-maximum clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Trailing window length in rows
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default)]
    pub leading_fill: LeadingFill,
}

fn default_window_size() -> usize {
    10
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            leading_fill: LeadingFill::default(),
        }
    }
}

/// Plot output size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_plot_width")]
    pub width: u32,

    #[serde(default = "default_plot_height")]
    pub height: u32,
}

fn default_plot_width() -> u32 {
    1920
}

fn default_plot_height() -> u32 {
    1080
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            height: default_plot_height(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub io: IoConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clustering.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.estimator.binary.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBinary);
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(ConfigError::ZeroPlotSize {
                width: self.plot.width,
                height: self.plot.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.io.input, PathBuf::from("kde_in.csv"));
        assert_eq!(config.io.output, PathBuf::from("kde_scan.csv"));
        assert_eq!(config.estimator.binary, PathBuf::from("./kde_1d"));
        assert_eq!(config.estimator.input_name, "file.csv");
        assert_eq!(config.estimator.output_name, "result.csv");
        assert_eq!(config.clustering.window_size, 10);
        assert_eq!(config.clustering.leading_fill, LeadingFill::ValueMax);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "clustering:\n  window_size: 3\n  leading_fill: kde-max\nestimator:\n  isolate: true\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.clustering.window_size, 3);
        assert_eq!(config.clustering.leading_fill, LeadingFill::KdeMax);
        assert!(config.estimator.isolate);
        assert!(config.estimator.keep_intermediate);
        assert_eq!(config.io.input, PathBuf::from("kde_in.csv"));
        assert_eq!(config.plot.width, 1920);
    }

    #[test]
    fn test_yaml_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.clustering.window_size = 25;
        config.estimator.args = vec!["--bandwidth".to_string(), "0.1".to_string()];
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.clustering.window_size, 25);
        assert_eq!(loaded.estimator.args, vec!["--bandwidth", "0.1"]);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = PipelineConfig::default();
        config.clustering.window_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWindow));
    }

    #[test]
    fn test_validate_rejects_empty_binary_and_plot_size() {
        let mut config = PipelineConfig::default();
        config.estimator.binary = PathBuf::new();
        assert_eq!(config.validate(), Err(ConfigError::EmptyBinary));

        let mut config = PipelineConfig::default();
        config.plot.height = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroPlotSize { width: 1920, height: 0 })
        );
    }
}

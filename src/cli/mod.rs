//! Command-line interface for the KDE clustering scan.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::LeadingFill;
use crate::processors::pipeline;
use crate::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "kde-cluster")]
#[command(
    about = "Cluster (address, value) samples by rolling maxima of an external 1-D KDE",
    version
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Sample points to form the KDE
    #[arg(long)]
    input: Option<PathBuf>,

    /// File name to save the scan
    #[arg(long)]
    output: Option<PathBuf>,

    /// Density estimator executable
    #[arg(long)]
    estimator: Option<PathBuf>,

    /// Directory the estimator runs in
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Run the estimator in a throwaway temporary directory
    #[arg(long)]
    isolate: bool,

    /// Remove the estimator exchange files after the run
    #[arg(long)]
    clean: bool,

    /// Rolling window size in rows
    #[arg(short, long)]
    window: Option<usize>,

    /// Fill for rows before the first complete window
    #[arg(long, value_enum)]
    leading_fill: Option<LeadingFill>,

    /// Also render the scan as a PNG
    #[arg(long)]
    plot: Option<PathBuf>,
}

impl Cli {
    /// Layer command-line overrides on top of a loaded configuration.
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(input) = &self.input {
            config.io.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.io.output = output.clone();
        }
        if let Some(plot) = &self.plot {
            config.io.plot = Some(plot.clone());
        }
        if let Some(binary) = &self.estimator {
            config.estimator.binary = binary.clone();
        }
        if let Some(work_dir) = &self.work_dir {
            config.estimator.work_dir = work_dir.clone();
        }
        if self.isolate {
            config.estimator.isolate = true;
        }
        if self.clean {
            config.estimator.keep_intermediate = false;
        }
        if let Some(window) = self.window {
            config.clustering.window_size = window;
        }
        if let Some(fill) = self.leading_fill {
            config.clustering.leading_fill = fill;
        }
        config
    }
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn load_config(path: Option<&PathBuf>) -> PipelineConfig {
    match path {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = cli.apply(load_config(cli.config.as_ref()));

    let start = Instant::now();

    println!("Running KDE cluster scan...");
    println!("Input: {}", config.io.input.display());
    println!("Output: {}", config.io.output.display());
    println!("Estimator: {}", config.estimator.binary.display());
    println!("Window size: {}", config.clustering.window_size);

    let spinner = create_spinner("Estimating density and clustering...");

    match pipeline::run(&config) {
        Ok(report) => {
            spinner.finish_and_clear();

            let mut items = vec![
                ("Input file", config.io.input.display().to_string()),
                ("Output file", report.output.display().to_string()),
                ("Samples", report.samples.to_string()),
                ("Estimates", report.estimates.to_string()),
                ("Rows written", report.merged.to_string()),
                ("Cluster levels", report.summary.num_clusters().to_string()),
                ("Window size", config.clustering.window_size.to_string()),
            ];
            if let Some(plot) = &report.plot {
                items.push(("Plot", plot.display().to_string()));
            }
            items.push(("Duration", format!("{:.2?}", start.elapsed())));

            print_summary("KDE Cluster Scan Complete", &items);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Scan failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let cli = Cli::parse_from(["kde-cluster"]);
        let config = cli.apply(PipelineConfig::default());

        assert_eq!(config.io.input, PathBuf::from("kde_in.csv"));
        assert_eq!(config.io.output, PathBuf::from("kde_scan.csv"));
        assert_eq!(config.clustering.window_size, 10);
        assert!(!config.estimator.isolate);
        assert!(config.estimator.keep_intermediate);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "kde-cluster",
            "--input",
            "samples.txt",
            "--output",
            "out/scan.txt",
            "--estimator",
            "/opt/kde/kde_1d",
            "--work-dir",
            "/tmp/kde",
            "--isolate",
            "--clean",
            "-w",
            "25",
            "--leading-fill",
            "kde-max",
            "--plot",
            "scan.png",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);

        let config = cli.apply(PipelineConfig::default());
        assert_eq!(config.io.input, PathBuf::from("samples.txt"));
        assert_eq!(config.io.output, PathBuf::from("out/scan.txt"));
        assert_eq!(config.io.plot, Some(PathBuf::from("scan.png")));
        assert_eq!(config.estimator.binary, PathBuf::from("/opt/kde/kde_1d"));
        assert_eq!(config.estimator.work_dir, PathBuf::from("/tmp/kde"));
        assert!(config.estimator.isolate);
        assert!(!config.estimator.keep_intermediate);
        assert_eq!(config.clustering.window_size, 25);
        assert_eq!(config.clustering.leading_fill, LeadingFill::KdeMax);
    }

    #[test]
    fn test_unreadable_config_falls_back_to_defaults() {
        let config = load_config(Some(&PathBuf::from("/nonexistent/config.yaml")));
        assert_eq!(config.clustering.window_size, 10);
    }
}

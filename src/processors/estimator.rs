//! Density estimation through an external executable.
//!
//! The estimator program is a black box with a file contract: it reads
//! `<index> <value>` rows from a fixed input name in its current directory and
//! writes `<index> <kde>` rows to a fixed output name next to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tempfile::TempDir;
use thiserror::Error;

use crate::config::EstimatorConfig;
use crate::core::loaders::{load_density, DensityPoint, LoaderError, Sample};
use crate::core::writers::{write_estimator_input, WriteError};

/// Errors that can occur while running the estimator.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("failed to prepare work directory '{path}': {source}")]
    WorkDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write estimator input: {0}")]
    Write(#[from] WriteError),

    #[error("failed to launch estimator '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("estimator '{binary}' exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("estimator finished without writing '{0}'")]
    MissingOutput(PathBuf),

    #[error("failed to read estimator output: {0}")]
    Load(#[from] LoaderError),
}

/// Result type for estimator operations.
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Anything that can turn samples into per-index density estimates.
pub trait DensityEstimator {
    fn estimate(&self, samples: &[Sample]) -> Result<Vec<DensityPoint>>;
}

/// Runs a density estimator program through its file contract.
#[derive(Debug, Clone)]
pub struct ExternalEstimator {
    binary: PathBuf,
    args: Vec<String>,
    work_dir: PathBuf,
    isolate: bool,
    keep_intermediate: bool,
    input_name: String,
    output_name: String,
}

impl ExternalEstimator {
    /// Build an estimator from configuration.
    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            args: config.args.clone(),
            work_dir: config.work_dir.clone(),
            isolate: config.isolate,
            keep_intermediate: config.keep_intermediate,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
        }
    }

    /// Executable path to spawn.
    ///
    /// Relative paths with a directory part (`./kde_1d`, `bin/kde`) are anchored
    /// to the caller's current directory, since the child runs elsewhere. Bare
    /// names are left for `PATH` lookup.
    pub fn resolve_binary(&self) -> std::io::Result<PathBuf> {
        resolve_binary(&self.binary, &std::env::current_dir()?)
    }

    fn prepare_dir(&self, dir: &Path) -> Result<()> {
        if dir.as_os_str().is_empty() || dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| EstimatorError::WorkDir {
            path: dir.display().to_string(),
            source: e,
        })
    }

    fn run_in(&self, dir: &Path, samples: &[Sample]) -> Result<Vec<DensityPoint>> {
        self.prepare_dir(dir)?;

        let input_path = dir.join(&self.input_name);
        let output_path = dir.join(&self.output_name);

        // A leftover result from an earlier run must not be mistaken for this one.
        if output_path.exists() {
            fs::remove_file(&output_path).map_err(|e| EstimatorError::WorkDir {
                path: output_path.display().to_string(),
                source: e,
            })?;
        }

        write_estimator_input(&input_path, samples)?;
        log::info!(
            "wrote {} samples to {}",
            samples.len(),
            input_path.display()
        );

        let binary = self.resolve_binary().map_err(|e| EstimatorError::Spawn {
            binary: self.binary.display().to_string(),
            source: e,
        })?;
        let binary_str = binary.display().to_string();

        log::info!("running {} {:?} in {}", binary_str, self.args, dir.display());
        let output = Command::new(&binary)
            .args(&self.args)
            .current_dir(if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
            .output()
            .map_err(|e| EstimatorError::Spawn {
                binary: binary_str.clone(),
                source: e,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("[estimator] {}", line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        for line in stderr.lines() {
            log::debug!("[estimator stderr] {}", line);
        }

        if !output.status.success() {
            return Err(EstimatorError::Failed {
                binary: binary_str,
                status: output.status,
                stderr,
            });
        }

        if !output_path.is_file() {
            return Err(EstimatorError::MissingOutput(output_path));
        }

        let points = load_density(&output_path)?;
        log::info!(
            "read {} density estimates from {}",
            points.len(),
            output_path.display()
        );

        if !self.isolate && !self.keep_intermediate {
            for path in [&input_path, &output_path] {
                if let Err(e) = fs::remove_file(path) {
                    log::warn!("failed to remove {}: {}", path.display(), e);
                }
            }
        }

        Ok(points)
    }
}

impl DensityEstimator for ExternalEstimator {
    fn estimate(&self, samples: &[Sample]) -> Result<Vec<DensityPoint>> {
        if self.isolate {
            let scratch = TempDir::new().map_err(|e| EstimatorError::WorkDir {
                path: std::env::temp_dir().display().to_string(),
                source: e,
            })?;
            log::debug!("isolated run in {}", scratch.path().display());
            self.run_in(scratch.path(), samples)
        } else {
            self.run_in(&self.work_dir, samples)
        }
    }
}

fn resolve_binary(binary: &Path, cwd: &Path) -> std::io::Result<PathBuf> {
    let bare = binary
        .parent()
        .map_or(true, |p| p.as_os_str().is_empty());
    if binary.is_absolute() || bare {
        Ok(binary.to_path_buf())
    } else {
        Ok(cwd.join(binary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_binary() {
        let cwd = Path::new("/work/here");

        assert_eq!(
            resolve_binary(Path::new("./kde_1d"), cwd).unwrap(),
            PathBuf::from("/work/here/./kde_1d")
        );
        assert_eq!(
            resolve_binary(Path::new("bin/kde"), cwd).unwrap(),
            PathBuf::from("/work/here/bin/kde")
        );
        assert_eq!(
            resolve_binary(Path::new("kde_1d"), cwd).unwrap(),
            PathBuf::from("kde_1d")
        );
        assert_eq!(
            resolve_binary(Path::new("/opt/kde/kde_1d"), cwd).unwrap(),
            PathBuf::from("/opt/kde/kde_1d")
        );
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use tempfile::tempdir;

        /// Doubles every value, standing in for a real estimator.
        const DOUBLING_SCRIPT: &str = "awk '{ print $1, $2 * 2 }' file.csv > result.csv";

        fn samples(values: &[f64]) -> Vec<Sample> {
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| Sample {
                    index: i,
                    address: format!("a{i}"),
                    value,
                })
                .collect()
        }

        fn shell_config(script: &str, work_dir: &Path) -> EstimatorConfig {
            EstimatorConfig {
                binary: PathBuf::from("/bin/sh"),
                args: vec!["-c".to_string(), script.to_string()],
                work_dir: work_dir.to_path_buf(),
                ..EstimatorConfig::default()
            }
        }

        #[test]
        fn test_estimate_roundtrip_through_script() {
            let dir = tempdir().unwrap();
            let estimator = ExternalEstimator::from_config(&shell_config(DOUBLING_SCRIPT, dir.path()));

            let points = estimator.estimate(&samples(&[0.5, 1.5, 3.0])).unwrap();

            assert_eq!(
                points,
                vec![
                    DensityPoint { index: 0, kde: 1.0 },
                    DensityPoint { index: 1, kde: 3.0 },
                    DensityPoint { index: 2, kde: 6.0 },
                ]
            );
            // Intermediates are kept by default.
            assert!(dir.path().join("file.csv").exists());
            assert!(dir.path().join("result.csv").exists());
        }

        #[test]
        fn test_estimate_removes_intermediates_when_asked() {
            let dir = tempdir().unwrap();
            let mut config = shell_config(DOUBLING_SCRIPT, dir.path());
            config.keep_intermediate = false;

            let points = ExternalEstimator::from_config(&config)
                .estimate(&samples(&[1.0]))
                .unwrap();

            assert_eq!(points.len(), 1);
            assert!(!dir.path().join("file.csv").exists());
            assert!(!dir.path().join("result.csv").exists());
        }

        #[test]
        fn test_isolated_run_leaves_work_dir_untouched() {
            let dir = tempdir().unwrap();
            let mut config = shell_config(DOUBLING_SCRIPT, dir.path());
            config.isolate = true;

            let points = ExternalEstimator::from_config(&config)
                .estimate(&samples(&[2.0, 4.0]))
                .unwrap();

            assert_eq!(points[1].kde, 8.0);
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        }

        #[test]
        fn test_stale_result_is_not_reused() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("result.csv"), "0 99\n").unwrap();
            let estimator = ExternalEstimator::from_config(&shell_config("true", dir.path()));

            let err = estimator.estimate(&samples(&[1.0])).unwrap_err();
            assert!(matches!(err, EstimatorError::MissingOutput(_)));
        }

        #[test]
        fn test_nonzero_exit_reports_stderr() {
            let dir = tempdir().unwrap();
            let estimator =
                ExternalEstimator::from_config(&shell_config("echo boom >&2; exit 3", dir.path()));

            match estimator.estimate(&samples(&[1.0])).unwrap_err() {
                EstimatorError::Failed { status, stderr, .. } => {
                    assert_eq!(status.code(), Some(3));
                    assert_eq!(stderr, "boom");
                }
                other => panic!("Expected Failed, got {other:?}"),
            }
        }

        #[test]
        fn test_missing_binary() {
            let dir = tempdir().unwrap();
            let config = EstimatorConfig {
                binary: PathBuf::from("/nonexistent/kde_1d"),
                work_dir: dir.path().to_path_buf(),
                ..EstimatorConfig::default()
            };

            let err = ExternalEstimator::from_config(&config)
                .estimate(&samples(&[1.0]))
                .unwrap_err();
            assert!(matches!(err, EstimatorError::Spawn { .. }));
        }

        #[test]
        fn test_malformed_output() {
            let dir = tempdir().unwrap();
            let estimator = ExternalEstimator::from_config(&shell_config(
                "echo '0 not-a-number' > result.csv",
                dir.path(),
            ));

            let err = estimator.estimate(&samples(&[1.0])).unwrap_err();
            assert!(matches!(err, EstimatorError::Load(_)));
        }

        #[test]
        fn test_work_dir_is_created() {
            let dir = tempdir().unwrap();
            let nested = dir.path().join("scratch").join("kde");
            let estimator = ExternalEstimator::from_config(&shell_config(DOUBLING_SCRIPT, &nested));

            estimator.estimate(&samples(&[1.0])).unwrap();
            assert!(nested.join("result.csv").exists());
        }
    }
}

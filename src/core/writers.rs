//! Data writers for the estimator exchange file and the scan output.
//!
//! All output is space-delimited without a header row.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::loaders::Sample;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// One row of the final scan: a sample joined with its density and cluster level.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub index: usize,
    pub address: String,
    pub value: f64,
    pub kde: f64,
    pub cluster: f64,
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a space-delimited CSV writer for the given path.
fn create_space_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(BufWriter::new(file)))
}

/// Write the estimator input: one `<index> <value>` row per sample.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_estimator_input(path: &Path, samples: &[Sample]) -> Result<()> {
    let mut csv_writer = create_space_writer(path)?;
    let path_str = path.display().to_string();

    for sample in samples {
        csv_writer
            .write_record(&[sample.index.to_string(), sample.value.to_string()])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write the scan: `<index> <address> <value> <kde> <cluster>` per record.
///
/// Parent directories are created if needed.
///
/// # Example
///
/// ```no_run
/// use kde_cluster::core::writers::{write_scan, ScanRecord};
/// use std::path::Path;
///
/// let records = vec![ScanRecord {
///     index: 0,
///     address: "0x10".to_string(),
///     value: 1.0,
///     kde: 0.4,
///     cluster: 0.4,
/// }];
/// write_scan(Path::new("kde_scan.csv"), &records).unwrap();
/// ```
pub fn write_scan(path: &Path, records: &[ScanRecord]) -> Result<()> {
    let mut csv_writer = create_space_writer(path)?;
    let path_str = path.display().to_string();

    for record in records {
        csv_writer
            .write_record(&[
                record.index.to_string(),
                record.address.clone(),
                record.value.to_string(),
                record.kde.to_string(),
                record.cluster.to_string(),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

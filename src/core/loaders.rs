//! Data loaders for sample and density files.
//!
//! Both formats are space-delimited without a header row:
//! - Sample files: `<address> <value>`, one sample per line
//! - Density files written by the estimator: `<index> <kde>`

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    MissingField {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {field} value '{value}'")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: '{value}' is not a non-negative integer index")]
    InvalidIndex { line: u64, value: String },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One input sample. `index` is its 0-based row position in the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub index: usize,
    pub address: String,
    pub value: f64,
}

/// Density estimate for the sample with the same index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub index: usize,
    pub kde: f64,
}

fn space_delimited<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn line_of(record: &StringRecord, row: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(row as u64 + 1)
}

/// First two non-empty fields of a record, or `None` for a blank line.
///
/// Runs of spaces split into empty fields, which are skipped.
fn fields_of(record: &StringRecord, line: u64) -> Result<Option<(&str, &str)>> {
    let mut fields = record.iter().filter(|f| !f.is_empty());
    match (fields.next(), fields.next()) {
        (None, _) => Ok(None),
        (Some(a), Some(b)) => Ok(Some((a, b))),
        (Some(_), None) => Err(LoaderError::MissingField {
            line,
            expected: 2,
            found: 1,
        }),
    }
}

fn parse_f64(raw: &str, line: u64, field: &'static str) -> Result<f64> {
    raw.parse().map_err(|_| LoaderError::InvalidNumber {
        line,
        field,
        value: raw.to_string(),
    })
}

/// Parse an index written either as an integer or as a float with no fraction.
fn parse_index(raw: &str, line: u64) -> Result<usize> {
    if let Ok(index) = raw.parse::<usize>() {
        return Ok(index);
    }
    let invalid = || LoaderError::InvalidIndex {
        line,
        value: raw.to_string(),
    };
    let as_float: f64 = raw.parse().map_err(|_| invalid())?;
    if as_float.is_finite() && as_float >= 0.0 && as_float.fract() == 0.0 && as_float <= usize::MAX as f64 {
        Ok(as_float as usize)
    } else {
        Err(invalid())
    }
}

/// Read samples from any reader.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>> {
    let mut reader = space_delimited(reader);
    let mut samples = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = line_of(&record, row);
        let Some((address, raw_value)) = fields_of(&record, line)? else {
            continue;
        };
        let value = parse_f64(raw_value, line, "value")?;

        samples.push(Sample {
            index: samples.len(),
            address: address.to_string(),
            value,
        });
    }

    Ok(samples)
}

/// Read estimator output from any reader.
pub fn read_density<R: Read>(reader: R) -> Result<Vec<DensityPoint>> {
    let mut reader = space_delimited(reader);
    let mut points = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = line_of(&record, row);
        let Some((raw_index, raw_kde)) = fields_of(&record, line)? else {
            continue;
        };

        points.push(DensityPoint {
            index: parse_index(raw_index, line)?,
            kde: parse_f64(raw_kde, line, "kde")?,
        });
    }

    Ok(points)
}

/// Load samples from a space-delimited `<address> <value>` file.
///
/// Row order defines each sample's index. An empty file yields no samples.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row has fewer than two
/// fields, or a value is not a number.
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let file = File::open(path.as_ref())?;
    read_samples(BufReader::new(file))
}

/// Load the estimator's `<index> <kde>` output file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row is malformed.
pub fn load_density<P: AsRef<Path>>(path: P) -> Result<Vec<DensityPoint>> {
    let file = File::open(path.as_ref())?;
    read_density(BufReader::new(file))
}

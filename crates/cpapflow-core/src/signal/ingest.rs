//! Recording ingestion and row validation
//!
//! A recording is line-oriented text: one header line describing the
//! columns, then one comma-separated row per sample with the elapsed time
//! followed by six raw ADC channels. Malformed rows are dropped and recorded
//! in the run's [`Diagnostics`]; they never abort ingestion.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::FIELDS_PER_ROW;

/// Number of ADC channels following the time column
pub const CHANNELS: usize = FIELDS_PER_ROW - 1;

/// Channel index (0-based, after the time column) of the constriction tap
pub const CONSTRICTION_CHANNEL: usize = 0;
/// Channel index of the inspiration-side upstream tap
pub const INSPIRATION_CHANNEL: usize = 1;
/// Channel index of the expiration-side upstream tap
pub const EXPIRATION_CHANNEL: usize = 2;

/// One validated row of a recording, in raw ADC counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Elapsed seconds since the start of the recording
    pub t: f64,
    /// Raw ADC counts for channels 1..=6
    pub channels: [f64; CHANNELS],
}

/// Reason a row was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing data: expected 7 fields, got {fields}")]
    MissingData { fields: usize },

    #[error("non-numerical entry: {token:?}")]
    NonNumericEntry { token: String },
}

impl From<RowError> for DiagnosticKind {
    fn from(err: RowError) -> Self {
        match err {
            RowError::MissingData { fields } => DiagnosticKind::MissingData { fields },
            RowError::NonNumericEntry { token } => DiagnosticKind::NonNumericEntry { token },
        }
    }
}

/// Parse one field; only finite numbers are accepted
fn parse_field(token: &str) -> Result<f64, RowError> {
    let trimmed = token.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowError::NonNumericEntry {
            token: trimmed.to_string(),
        }),
    }
}

/// Validate an already split row
///
/// The row must have exactly seven fields and every field must be a finite
/// number. The literal `NaN` token is rejected like any other non-number.
///
/// # Example
/// ```
/// use cpapflow_core::signal::ingest::{validate_row, RowError};
///
/// let sample = validate_row(&["0.01", "5018", "1638", "5039", "5276", "5276", "1638"]).unwrap();
/// assert_eq!(sample.t, 0.01);
///
/// let err = validate_row(&["0.01", "5018", "NaN", "5039", "5276", "5276", "1638"]).unwrap_err();
/// assert!(matches!(err, RowError::NonNumericEntry { .. }));
/// ```
pub fn validate_row(fields: &[&str]) -> Result<RawSample, RowError> {
    if fields.len() != FIELDS_PER_ROW {
        return Err(RowError::MissingData {
            fields: fields.len(),
        });
    }

    let t = parse_field(fields[0])?;
    let mut channels = [0.0; CHANNELS];
    for (slot, token) in channels.iter_mut().zip(&fields[1..]) {
        *slot = parse_field(token)?;
    }

    Ok(RawSample { t, channels })
}

/// Split a data line on commas and validate it
pub fn parse_row(line: &str) -> Result<RawSample, RowError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.split(',').collect();
    validate_row(&fields)
}

/// Read all valid samples from a line-oriented source
///
/// The first line is skipped unconditionally. Rejected rows are recorded in
/// `diagnostics` with their 1-based line number; a row that is not valid
/// UTF-8 is rejected as a non-numerical entry. Only I/O failures are
/// returned as errors; an empty or all-invalid source yields an empty vector.
pub fn read_samples<R: BufRead>(
    mut reader: R,
    diagnostics: &mut Diagnostics,
) -> io::Result<Vec<RawSample>> {
    let mut samples = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        if line_no == 1 {
            continue;
        }

        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) => parse_row(line),
            Err(_) => Err(RowError::NonNumericEntry {
                token: String::from_utf8_lossy(&buf).trim().to_string(),
            }),
        };
        match parsed {
            Ok(sample) => samples.push(sample),
            Err(err) => diagnostics.push(Some(line_no), err.into()),
        }
    }

    tracing::debug!(
        samples = samples.len(),
        rejected = diagnostics.rejected_rows(),
        "Ingestion complete"
    );

    Ok(samples)
}

/// Read all valid samples from a recording file
pub fn read_samples_from_path(
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> io::Result<Vec<RawSample>> {
    tracing::info!(path = %path.display(), "Starting analysis");
    let file = File::open(path)?;
    read_samples(BufReader::new(file), diagnostics)
}

/// Read all valid samples from an in-memory recording
pub fn parse_samples(text: &str, diagnostics: &mut Diagnostics) -> Vec<RawSample> {
    // Reading from a byte slice cannot fail
    read_samples(text.as_bytes(), diagnostics).unwrap_or_default()
}

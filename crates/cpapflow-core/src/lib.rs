//! cpapflow Core - CPAP sensor signal processing and breathing metrics
//!
//! This library turns a captured CPAP recording (raw ADC samples from the
//! Venturi pressure taps) into breathing rate, apnea count and mask leakage,
//! together with a PNG trace of the reconstructed flow waveform.
//!
//! The pipeline runs leaf to root:
//! ingestion ([`signal::ingest`]) → calibration ([`signal::calibration`]) →
//! flow reconstruction ([`signal::flow`]) → breath detection
//! ([`signal::detector`]) → metrics ([`report::metrics`]).

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod signal;

pub use config::AnalysisConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{AnalysisError, DataShortfall};
pub use pipeline::{analyze_path, analyze_reader, analyze_str, Analysis};
pub use report::metrics::{MetricsRecord, Visualization};
pub use signal::detector::BreathDetector;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Number of comma-separated fields in one recording row (time + 6 channels)
pub const FIELDS_PER_ROW: usize = 7;

//! Run-level failures of the analysis pipeline
//!
//! Row-level problems never show up here: they are absorbed by ingestion and
//! recorded in [`crate::Diagnostics`].

use thiserror::Error;

/// Why a run could not produce metrics from the data it was given
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataShortfall {
    #[error("no valid samples after ingestion")]
    NoValidSamples,

    #[error("spline fit needs at least {required} points, got {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("no breaths detected in recording")]
    NoBreathsDetected,

    #[error("recording duration is zero")]
    ZeroDuration,
}

/// Pipeline error types
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(#[from] DataShortfall),

    #[error("Time stamps must be strictly increasing (sample {index})")]
    NonIncreasingTime { index: usize },

    #[error("Upstream pressure below constriction pressure at t = {t}s")]
    FlowInversion { t: f64 },

    #[error("Failed to render flow chart: {0}")]
    Render(String),

    #[error("Failed to read recording: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// True for the "insufficient data" family of failures
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AnalysisError::InsufficientData(_))
    }
}

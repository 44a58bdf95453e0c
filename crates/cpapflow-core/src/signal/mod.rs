//! Signal processing module
//!
//! This module contains the numerical stages of the pipeline:
//! - Row parsing and validation ([`ingest`])
//! - ADC to cmH2O conversion ([`calibration`])
//! - Venturi flow reconstruction ([`flow`])
//! - Cubic spline smoothing ([`spline`])
//! - Prominence-based peak search ([`peaks`])
//! - Breath detection built on the two above ([`detector`])

pub mod calibration;
pub mod detector;
pub mod flow;
pub mod ingest;
pub mod peaks;
pub mod spline;

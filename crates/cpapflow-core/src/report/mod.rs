//! Reporting module
//!
//! - Breath metrics and the result record ([`metrics`])
//! - PNG rendering of the smoothed flow curve ([`plot`])

pub mod metrics;
pub mod plot;

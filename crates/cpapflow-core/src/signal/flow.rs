//! Venturi flow reconstruction
//!
//! Converts the differential pressure between an upstream tap and the
//! constriction into volumetric airflow using Bernoulli's relation for a
//! Venturi tube:
//!
//! ```text
//! Q = A1 * sqrt( (2/rho) * (P1 - P2) / ((A1/A2)^2 - 1) )
//! ```
//!
//! Flow direction is taken from whichever upstream tap (inspiration or
//! expiration) reads higher. Expiratory flow is reported negative.

use crate::config::{InversionPolicy, VenturiConfig};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{AnalysisError, DataShortfall};
use crate::signal::calibration::PressureSample;

/// Pascals per cmH2O
pub const PA_PER_CMH2O: f64 = 98.0665;

/// Liters per cubic meter
const LITERS_PER_M3: f64 = 1000.0;

/// Signed airflow at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowPoint {
    /// Elapsed seconds
    pub t: f64,
    /// Flow in L/s; positive for inspiration, negative for expiration
    pub q: f64,
}

/// Reconstructed flow waveform of a whole recording
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSeries {
    pub points: Vec<FlowPoint>,
    /// `max(t) - min(t)` over all retained samples
    pub duration: f64,
    /// Samples whose upstream pressure fell below the constriction pressure
    pub inversions: usize,
}

impl FlowSeries {
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.t).collect()
    }

    pub fn flows(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.q).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Flow magnitude, or the negative pressure difference that prevented one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VenturiReading {
    Flow(f64),
    /// Upstream below constriction; carries `P1 - P2` in pascals
    Inverted(f64),
}

/// Venturi tube model with precomputed geometry
#[derive(Debug, Clone, Copy)]
pub struct Venturi {
    density: f64,
    /// Upstream cross-section in m^2
    a1: f64,
    /// `(A1/A2)^2 - 1`
    area_term: f64,
    policy: InversionPolicy,
}

impl Venturi {
    pub fn new(config: &VenturiConfig) -> Self {
        let a1 = std::f64::consts::PI * (config.upstream_diameter_mm / 2.0 / 1000.0).powi(2);
        let a2 = std::f64::consts::PI * (config.throat_diameter_mm / 2.0 / 1000.0).powi(2);
        Self {
            density: config.air_density,
            a1,
            area_term: (a1 / a2).powi(2) - 1.0,
            policy: config.inversion_policy,
        }
    }

    /// Evaluate the Venturi relation for pressures given in cmH2O
    pub fn reading(&self, p1_cmh2o: f64, p2_cmh2o: f64) -> VenturiReading {
        let p1 = p1_cmh2o * PA_PER_CMH2O;
        let p2 = p2_cmh2o * PA_PER_CMH2O;
        let dp = p1 - p2;
        if dp < 0.0 {
            return VenturiReading::Inverted(dp);
        }
        let q = self.a1 * ((2.0 / self.density) * (dp / self.area_term)).sqrt();
        VenturiReading::Flow(q * LITERS_PER_M3)
    }

    /// Unsigned flow in L/s; NaN when `p1 < p2`
    pub fn flow(&self, p1_cmh2o: f64, p2_cmh2o: f64) -> f64 {
        match self.reading(p1_cmh2o, p2_cmh2o) {
            VenturiReading::Flow(q) => q,
            VenturiReading::Inverted(_) => f64::NAN,
        }
    }

    /// Signed flow for one calibrated sample
    ///
    /// Ties between the two upstream taps count as inspiration.
    pub fn signed_flow(
        &self,
        sample: &PressureSample,
        diagnostics: &mut Diagnostics,
    ) -> Result<(f64, bool), AnalysisError> {
        let (upstream, sign) = if sample.inspiration() >= sample.expiration() {
            (sample.inspiration(), 1.0)
        } else {
            (sample.expiration(), -1.0)
        };

        match self.reading(upstream, sample.constriction()) {
            VenturiReading::Flow(q) => Ok((sign * q, false)),
            VenturiReading::Inverted(dp) => match self.policy {
                InversionPolicy::ClampToZero => {
                    diagnostics.push(
                        None,
                        DiagnosticKind::FlowInversion {
                            t: sample.t,
                            radicand_pa: dp,
                        },
                    );
                    Ok((0.0, true))
                }
                InversionPolicy::Reject => Err(AnalysisError::FlowInversion { t: sample.t }),
            },
        }
    }

    /// Reconstruct the flow waveform of a calibrated recording
    pub fn reconstruct(
        &self,
        pressures: &[PressureSample],
        diagnostics: &mut Diagnostics,
    ) -> Result<FlowSeries, AnalysisError> {
        if pressures.is_empty() {
            return Err(DataShortfall::NoValidSamples.into());
        }

        let mut points = Vec::with_capacity(pressures.len());
        let mut inversions = 0;
        let mut t_min = f64::INFINITY;
        let mut t_max = f64::NEG_INFINITY;

        for sample in pressures {
            let (q, inverted) = self.signed_flow(sample, diagnostics)?;
            if inverted {
                inversions += 1;
            }
            t_min = t_min.min(sample.t);
            t_max = t_max.max(sample.t);
            points.push(FlowPoint { t: sample.t, q });
        }

        if inversions > 0 {
            tracing::warn!(inversions, "Flow inversions clamped to zero");
        }

        Ok(FlowSeries {
            points,
            duration: t_max - t_min,
            inversions,
        })
    }
}

impl Default for Venturi {
    fn default() -> Self {
        Self::new(&VenturiConfig::default())
    }
}

/// Unsigned Venturi flow (L/s) for the default tube, pressures in cmH2O
///
/// # Example
/// ```
/// use cpapflow_core::signal::flow::venturi_flow;
///
/// assert!((venturi_flow(10.0, 3.0) - 4.980741048784845).abs() < 1e-9);
/// ```
pub fn venturi_flow(p1_cmh2o: f64, p2_cmh2o: f64) -> f64 {
    Venturi::default().flow(p1_cmh2o, p2_cmh2o)
}

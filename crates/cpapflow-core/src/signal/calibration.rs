//! ADC to pressure calibration
//!
//! The pressure sensors are calibrated with two points: `zero_adc` reads
//! 0 cmH2O and `span_adc` reads `span_cmh2o`. Every channel except the time
//! column goes through the same affine map.

use crate::config::CalibrationConfig;
use crate::signal::ingest::{
    RawSample, CHANNELS, CONSTRICTION_CHANNEL, EXPIRATION_CHANNEL, INSPIRATION_CHANNEL,
};

/// One sample with every channel expressed in cmH2O
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSample {
    /// Elapsed seconds, copied from the raw sample
    pub t: f64,
    /// Pressures in cmH2O for channels 1..=6
    pub channels: [f64; CHANNELS],
}

impl PressureSample {
    /// Pressure at the Venturi constriction
    pub fn constriction(&self) -> f64 {
        self.channels[CONSTRICTION_CHANNEL]
    }

    /// Upstream pressure on the inspiration side
    pub fn inspiration(&self) -> f64 {
        self.channels[INSPIRATION_CHANNEL]
    }

    /// Upstream pressure on the expiration side
    pub fn expiration(&self) -> f64 {
        self.channels[EXPIRATION_CHANNEL]
    }
}

/// Affine ADC → cmH2O transform
///
/// # Example
/// ```
/// use cpapflow_core::signal::calibration::Calibration;
///
/// let cal = Calibration::default();
/// assert_eq!(cal.adc_to_cmh2o(1638.0), 0.0);
/// assert!((cal.adc_to_cmh2o(14745.0) - 25.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    zero_adc: f64,
    scale: f64,
}

impl Calibration {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            zero_adc: config.zero_adc,
            scale: config.span_cmh2o / (config.span_adc - config.zero_adc),
        }
    }

    /// Convert a single ADC reading to cmH2O
    pub fn adc_to_cmh2o(&self, raw: f64) -> f64 {
        self.scale * (raw - self.zero_adc)
    }

    /// Calibrate one sample, leaving the time column untouched
    pub fn calibrate(&self, raw: &RawSample) -> PressureSample {
        PressureSample {
            t: raw.t,
            channels: raw.channels.map(|adc| self.adc_to_cmh2o(adc)),
        }
    }

    /// Calibrate a whole recording, preserving order
    pub fn calibrate_all(&self, raw: &[RawSample]) -> Vec<PressureSample> {
        raw.iter().map(|s| self.calibrate(s)).collect()
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(&CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_point_maps_to_zero() {
        assert_eq!(Calibration::default().adc_to_cmh2o(1638.0), 0.0);
    }

    #[test]
    fn test_span_point_maps_to_span() {
        assert_relative_eq!(
            Calibration::default().adc_to_cmh2o(14745.0),
            25.4,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_affine_formula() {
        let cal = Calibration::default();
        for raw in [-500.0, 0.0, 1000.0, 5018.0, 9000.5, 20000.0] {
            let expected = (25.4 / (14745.0 - 1638.0)) * (raw - 1638.0);
            assert_eq!(cal.adc_to_cmh2o(raw), expected);
        }
    }

    #[test]
    fn test_calibrate_sample_keeps_time() {
        let raw = RawSample {
            t: 2.685,
            channels: [5018.0, 1638.0, 5039.0, 5276.0, 5276.0, 1638.0],
        };
        let expected = [
            6.55008774, 0.0, 6.59078355, 7.05006485, 7.05006485, 0.0,
        ];

        let p = Calibration::default().calibrate(&raw);
        assert_eq!(p.t, 2.685);
        for (got, want) in p.channels.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
        assert_relative_eq!(p.constriction(), 6.55008774, epsilon = 1e-6);
        assert_eq!(p.inspiration(), 0.0);
        assert_relative_eq!(p.expiration(), 6.59078355, epsilon = 1e-6);
    }

    #[test]
    fn test_calibrate_all_is_pure_and_ordered() {
        let raw = vec![
            RawSample {
                t: 0.0,
                channels: [1638.0; CHANNELS],
            },
            RawSample {
                t: 0.01,
                channels: [14745.0; CHANNELS],
            },
        ];
        let before = raw.clone();

        let pressures = Calibration::default().calibrate_all(&raw);
        assert_eq!(raw, before);
        assert_eq!(pressures.len(), 2);
        assert_eq!(pressures[0].channels, [0.0; CHANNELS]);
        assert_eq!(pressures[1].t, 0.01);
    }

    #[test]
    fn test_custom_calibration_points() {
        let cal = Calibration::new(&CalibrationConfig {
            zero_adc: 0.0,
            span_adc: 100.0,
            span_cmh2o: 10.0,
        });
        assert_relative_eq!(cal.adc_to_cmh2o(50.0), 5.0);
    }
}

//! Breath detection on the reconstructed flow waveform
//!
//! The raw flow is fitted with an interpolating cubic spline and resampled
//! onto a much coarser even grid (2.7% of the input length by default). The
//! coarse grid smooths out sensor noise and keeps the peak search cheap.
//! Every inspiratory peak that clears the height and prominence thresholds
//! is one breath.

use crate::config::{DetectorConfig, PlotConfig};
use crate::error::AnalysisError;
use crate::report::metrics::Visualization;
use crate::report::plot;
use crate::signal::peaks::{find_peaks, PeakCriteria};
use crate::signal::spline::CubicSpline;

/// Smoothed flow curve and the breaths found on it
#[derive(Debug, Clone, PartialEq)]
pub struct BreathTrace {
    /// Evenly spaced times of the resampled curve
    pub grid: Vec<f64>,
    /// Smoothed flow (L/s) at each grid time
    pub smoothed: Vec<f64>,
    /// Indices into `grid` of detected inspiratory peaks
    pub peaks: Vec<usize>,
}

impl BreathTrace {
    /// Timestamps of detected breaths, ascending
    pub fn breath_times(&self) -> Vec<f64> {
        self.peaks.iter().map(|&i| self.grid[i]).collect()
    }

    /// Number of detected breaths
    pub fn breath_count(&self) -> usize {
        self.peaks.len()
    }
}

/// Spline-smoothing breath detector
///
/// # Example
/// ```
/// use cpapflow_core::BreathDetector;
///
/// let t: Vec<f64> = (0..10000).map(|i| i as f64 * 8.0 * std::f64::consts::PI / 9999.0).collect();
/// let q: Vec<f64> = t.iter().map(|x| x.sin()).collect();
///
/// let trace = BreathDetector::default().detect(&t, &q).unwrap();
/// assert_eq!(trace.breath_count(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BreathDetector {
    config: DetectorConfig,
    plot: PlotConfig,
}

impl BreathDetector {
    pub fn new(config: DetectorConfig, plot: PlotConfig) -> Self {
        Self { config, plot }
    }

    /// Size of the resampled grid for `n` input points
    pub fn grid_size(&self, n: usize) -> usize {
        (self.config.resample_ratio * n as f64).round() as usize
    }

    /// Smooth the flow series and locate breaths
    ///
    /// `times` must be strictly increasing with at least four points.
    pub fn detect(&self, times: &[f64], flows: &[f64]) -> Result<BreathTrace, AnalysisError> {
        let spline = CubicSpline::fit(times, flows)?;
        let count = self.grid_size(times.len());
        let (grid, smoothed) = spline.resample(count);

        let criteria = PeakCriteria {
            min_height: self.config.min_peak_height,
            min_prominence: self.config.min_prominence,
        };
        let peaks = find_peaks(&smoothed, &criteria);

        tracing::debug!(
            points = times.len(),
            grid = count,
            breaths = peaks.len(),
            "Breath detection complete"
        );

        Ok(BreathTrace {
            grid,
            smoothed,
            peaks,
        })
    }

    /// Detect breaths and render the QC chart of the smoothed curve
    pub fn detect_and_render(
        &self,
        times: &[f64],
        flows: &[f64],
    ) -> Result<(BreathTrace, Visualization), AnalysisError> {
        let trace = self.detect(times, flows)?;
        let visualization = self.render(&trace, times)?;
        Ok((trace, visualization))
    }

    /// Render the QC chart of a trace over the span of `times`
    pub fn render(
        &self,
        trace: &BreathTrace,
        times: &[f64],
    ) -> Result<Visualization, AnalysisError> {
        let png = plot::render_flow_chart(trace, span(times), &self.plot)?;
        Ok(Visualization::new(png))
    }
}

fn span(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataShortfall;
    use crate::signal::spline::linspace;

    fn sine(n: usize, cycles: f64) -> (Vec<f64>, Vec<f64>) {
        let t = linspace(0.0, cycles * 2.0 * std::f64::consts::PI, n);
        let q = t.iter().map(|x| x.sin()).collect();
        (t, q)
    }

    #[test]
    fn test_grid_size_rounds() {
        let detector = BreathDetector::default();
        assert_eq!(detector.grid_size(10000), 270);
        assert_eq!(detector.grid_size(17999), 486);
        assert_eq!(detector.grid_size(4), 0);
    }

    #[test]
    fn test_sine_has_one_peak_per_cycle() {
        let (t, q) = sine(10000, 4.0);
        let trace = BreathDetector::default().detect(&t, &q).unwrap();

        assert_eq!(trace.grid.len(), 270);
        assert_eq!(trace.breath_count(), 4);
        let times = trace.breath_times();
        for (k, bt) in times.iter().enumerate() {
            let expected = std::f64::consts::FRAC_PI_2 + 2.0 * std::f64::consts::PI * k as f64;
            assert!(
                (bt - expected).abs() < 0.1,
                "Peak {} at {} expected near {}",
                k,
                bt,
                expected
            );
        }
    }

    #[test]
    fn test_low_amplitude_wave_has_no_breaths() {
        let (t, q) = sine(5000, 5.0);
        let small: Vec<f64> = q.iter().map(|v| v * 0.05).collect();
        let trace = BreathDetector::default().detect(&t, &small).unwrap();
        assert_eq!(trace.breath_count(), 0);
    }

    #[test]
    fn test_degenerate_input_fails_predictably() {
        let err = BreathDetector::default()
            .detect(&[0.0, 0.1], &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData(DataShortfall::TooFewPoints { .. })
        ));
    }

    #[test]
    fn test_tiny_input_yields_empty_grid() {
        let trace = BreathDetector::default()
            .detect(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 0.0, 1.0])
            .unwrap();
        assert!(trace.grid.is_empty());
        assert_eq!(trace.breath_count(), 0);
    }

    #[test]
    fn test_detect_and_render_produces_png() {
        let (t, q) = sine(2000, 3.0);
        let (trace, vis) = BreathDetector::default()
            .detect_and_render(&t, &q)
            .unwrap();
        assert_eq!(trace.breath_count(), 3);
        assert!(vis.png().starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

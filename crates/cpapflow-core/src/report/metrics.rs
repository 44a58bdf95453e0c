//! Breath metrics and the per-run result record
//!
//! Breathing rate and apnea count come from the breath timestamps; leakage
//! is the trapezoidal integral of the signed flow over the whole recording.
//! A sealed circuit integrates to roughly zero or a small positive leak, so
//! a negative integral is reported as a warning but still returned.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{AnalysisError, DataShortfall};

/// Rendered flow chart (PNG), serialized as a base64 string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visualization {
    png: Vec<u8>,
}

impl Visualization {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png }
    }

    /// Raw PNG bytes
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Standard base64 encoding of the PNG
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::new(STANDARD.decode(encoded)?))
    }
}

impl Serialize for Visualization {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Visualization {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Result of one analysis run, handed to the reporting layer as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Recording length in seconds
    pub duration: f64,
    /// Number of detected breaths
    pub breaths: usize,
    pub breath_rate_bpm: f64,
    /// Breath timestamps in seconds
    pub breath_times: Vec<f64>,
    pub apnea_count: usize,
    /// Net volume in liters; negative values are anomalous
    pub leakage: f64,
    /// Samples whose flow was clamped to zero
    #[serde(default)]
    pub flow_inversions: usize,
    pub visualization: Visualization,
}

impl MetricsRecord {
    /// More than one apnea in a session warrants attention
    pub fn apnea_danger(&self) -> bool {
        self.apnea_count > 1
    }

    pub fn has_negative_leakage(&self) -> bool {
        self.leakage < 0.0
    }
}

/// Breath count, breaths per minute and apnea count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathStats {
    pub breaths: usize,
    pub breath_rate_bpm: f64,
    pub apnea_count: usize,
}

/// Count adjacent breath pairs separated by strictly more than `gap_s`
pub fn count_apneas(breath_times: &[f64], gap_s: f64) -> usize {
    breath_times
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + gap_s)
        .count()
}

/// Derive breathing statistics from breath timestamps
///
/// Fails with [`DataShortfall::NoBreathsDetected`] when there are no breaths
/// and [`DataShortfall::ZeroDuration`] when the recording has no length.
///
/// # Example
/// ```
/// use cpapflow_core::report::metrics::breath_analysis;
///
/// let stats = breath_analysis(&[10.0, 15.0, 16.0, 27.0, 28.0, 30.0, 42.0], 80.0, 10.0).unwrap();
/// assert_eq!(stats.breaths, 7);
/// assert_eq!(stats.breath_rate_bpm, 5.25);
/// assert_eq!(stats.apnea_count, 2);
/// ```
pub fn breath_analysis(
    breath_times: &[f64],
    duration_s: f64,
    apnea_gap_s: f64,
) -> Result<BreathStats, AnalysisError> {
    if breath_times.is_empty() {
        return Err(DataShortfall::NoBreathsDetected.into());
    }
    if duration_s <= 0.0 {
        return Err(DataShortfall::ZeroDuration.into());
    }

    let breaths = breath_times.len();
    Ok(BreathStats {
        breaths,
        breath_rate_bpm: breaths as f64 / (duration_s / 60.0),
        apnea_count: count_apneas(breath_times, apnea_gap_s),
    })
}

/// Trapezoidal integral of `flows` over `times`
pub fn trapezoid_leakage(times: &[f64], flows: &[f64]) -> f64 {
    times
        .windows(2)
        .zip(flows.windows(2))
        .map(|(t, q)| (t[1] - t[0]) * (q[0] + q[1]) / 2.0)
        .sum()
}

/// Leakage volume in liters, recording a warning when it is negative
pub fn leakage(times: &[f64], flows: &[f64], diagnostics: &mut Diagnostics) -> f64 {
    let liters = trapezoid_leakage(times, flows);
    if liters < 0.0 {
        diagnostics.push(None, DiagnosticKind::NegativeLeakage { liters });
    }
    liters
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const STEP_T: [f64; 11] = [0.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0, 6.0];

    #[test]
    fn test_breath_analysis_reference() {
        let stats =
            breath_analysis(&[10.0, 15.0, 16.0, 27.0, 28.0, 30.0, 42.0], 80.0, 10.0).unwrap();
        assert_eq!(stats.breaths, 7);
        assert_eq!(stats.breath_rate_bpm, 5.25);
        assert_eq!(stats.apnea_count, 2);
    }

    #[test]
    fn test_gap_of_exactly_threshold_is_not_apnea() {
        assert_eq!(count_apneas(&[0.0, 10.0, 20.0], 10.0), 0);
        assert_eq!(count_apneas(&[0.0, 10.5, 20.0], 10.0), 1);
    }

    #[test]
    fn test_single_breath_has_no_apnea() {
        let stats = breath_analysis(&[5.0], 60.0, 10.0).unwrap();
        assert_eq!(stats.breaths, 1);
        assert_eq!(stats.breath_rate_bpm, 1.0);
        assert_eq!(stats.apnea_count, 0);
    }

    #[test]
    fn test_no_breaths_is_insufficient_data() {
        let err = breath_analysis(&[], 60.0, 10.0).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData(DataShortfall::NoBreathsDetected)
        ));
    }

    #[test]
    fn test_zero_duration_is_insufficient_data() {
        let err = breath_analysis(&[1.0], 0.0, 10.0).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData(DataShortfall::ZeroDuration)
        ));
    }

    #[test]
    fn test_negative_leakage_warns_but_returns_value() {
        let flows = [0.0, 0.0, 0.0, 3.0, 3.0, 0.0, 0.0, -4.0, -4.0, 0.0, 0.0];
        let mut diag = Diagnostics::new();
        let liters = leakage(&STEP_T, &flows, &mut diag);

        assert_eq!(liters, -1.0);
        assert!(diag.has_negative_leakage());
        assert_eq!(diag.warnings().count(), 1);
    }

    #[test]
    fn test_positive_leakage_is_clean() {
        let flows = [0.0, 0.0, 0.0, 3.0, 3.0, 0.0, 0.0, 4.0, 4.0, 0.0, 0.0];
        let mut diag = Diagnostics::new();
        let liters = leakage(&STEP_T, &flows, &mut diag);

        assert_eq!(liters, 7.0);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_trapezoid_of_ramp() {
        let t: Vec<f64> = (0..=100).map(|i| i as f64 * 0.01).collect();
        let q: Vec<f64> = t.iter().map(|v| 2.0 * v).collect();
        assert_relative_eq!(trapezoid_leakage(&t, &q), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoid_degenerate_inputs() {
        assert_eq!(trapezoid_leakage(&[], &[]), 0.0);
        assert_eq!(trapezoid_leakage(&[1.0], &[5.0]), 0.0);
    }

    #[test]
    fn test_visualization_serializes_as_base64() {
        let vis = Visualization::new(vec![0x89, b'P', b'N', b'G']);
        let json = serde_json::to_string(&vis).unwrap();
        assert_eq!(json, "\"iVBORw==\"");

        let back: Visualization = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vis);
    }

    #[test]
    fn test_record_roundtrips_floats_exactly() {
        let record = MetricsRecord {
            duration: 59.99,
            breaths: 15,
            breath_rate_bpm: 15.0 / (59.99 / 60.0),
            breath_times: vec![12.823773584905659, 0.1 + 0.2, 1.0 / 3.0],
            apnea_count: 0,
            leakage: -2.2250738585072014e-308,
            flow_inversions: 0,
            visualization: Visualization::new(vec![1, 2, 3]),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: MetricsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(serde_json::from_str::<Visualization>("\"not base64!\"").is_err());
    }

    #[test]
    fn test_record_json_keys() {
        let record = MetricsRecord {
            duration: 179.98,
            breaths: 2,
            breath_rate_bpm: 0.6667,
            breath_times: vec![3.5, 7.5],
            apnea_count: 0,
            leakage: 1.25,
            flow_inversions: 0,
            visualization: Visualization::default(),
        };
        let value = serde_json::to_value(&record).unwrap();
        for key in [
            "duration",
            "breaths",
            "breath_rate_bpm",
            "breath_times",
            "apnea_count",
            "leakage",
            "flow_inversions",
            "visualization",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["visualization"], "");
        assert!(!record.apnea_danger());
        assert!(!record.has_negative_leakage());
    }

    #[test]
    fn test_apnea_danger_threshold() {
        let mut record: MetricsRecord = serde_json::from_str(
            r#"{"duration": 60.0, "breaths": 3, "breath_rate_bpm": 3.0,
                "breath_times": [1.0, 20.0, 40.0], "apnea_count": 2,
                "leakage": -0.5, "visualization": ""}"#,
        )
        .unwrap();
        assert_eq!(record.flow_inversions, 0);
        assert!(record.apnea_danger());
        assert!(record.has_negative_leakage());

        record.apnea_count = 1;
        assert!(!record.apnea_danger());
    }
}

//! Analysis configuration
//!
//! All pipeline constants live here. The defaults are the fixed device
//! constants of the CPAP Venturi sensor and must stay exact for numerical
//! parity with recorded reference results. Stored as JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Two-point linear ADC → cmH2O calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// ADC reading corresponding to 0 cmH2O
    pub zero_adc: f64,
    /// ADC reading corresponding to `span_cmh2o`
    pub span_adc: f64,
    /// Pressure at `span_adc` in cmH2O
    pub span_cmh2o: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            zero_adc: 1638.0,
            span_adc: 14745.0,
            span_cmh2o: 25.4,
        }
    }
}

/// What to do when the Venturi radicand goes negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionPolicy {
    /// Report zero flow for the sample and record a warning
    #[default]
    ClampToZero,
    /// Fail the run
    Reject,
}

/// Venturi tube geometry and air properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenturiConfig {
    /// Air density in kg/m^3
    pub air_density: f64,
    /// Upstream tube diameter in mm
    pub upstream_diameter_mm: f64,
    /// Constriction diameter in mm
    pub throat_diameter_mm: f64,
    pub inversion_policy: InversionPolicy,
}

impl Default for VenturiConfig {
    fn default() -> Self {
        Self {
            air_density: 1.199,
            upstream_diameter_mm: 15.0,
            throat_diameter_mm: 12.0,
            inversion_policy: InversionPolicy::default(),
        }
    }
}

/// Smoothing and peak-search parameters of the breath detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Resampled grid size as a fraction of the input length
    pub resample_ratio: f64,
    /// Minimum peak height in L/s
    pub min_peak_height: f64,
    /// Minimum peak prominence in L/s
    pub min_prominence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            resample_ratio: 0.027,
            min_peak_height: 0.05,
            min_prominence: 0.18,
        }
    }
}

/// Output size of the rendered flow chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

fn default_apnea_gap_s() -> f64 {
    10.0
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub venturi: VenturiConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    /// Gap between consecutive breaths (seconds) that counts as an apnea
    #[serde(default = "default_apnea_gap_s")]
    pub apnea_gap_s: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            venturi: VenturiConfig::default(),
            detector: DetectorConfig::default(),
            plot: PlotConfig::default(),
            apnea_gap_s: default_apnea_gap_s(),
        }
    }
}

/// Config file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AnalysisConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded analysis config");
        Ok(config)
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(_)) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}

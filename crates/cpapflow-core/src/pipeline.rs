//! End-to-end analysis of one recording
//!
//! Each call is an independent, synchronous run with its own diagnostics
//! sink, so separate recordings can be analyzed on separate threads.

use std::io::BufRead;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{AnalysisError, DataShortfall};
use crate::report::metrics::{self, MetricsRecord, Visualization};
use crate::signal::calibration::Calibration;
use crate::signal::detector::BreathDetector;
use crate::signal::flow::Venturi;
use crate::signal::ingest::{self, RawSample};

/// Metrics of a successful run plus everything logged along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub metrics: MetricsRecord,
    pub diagnostics: Diagnostics,
}

/// Analyze a recording file
pub fn analyze_path(path: &Path, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    let mut diagnostics = Diagnostics::new();
    let raw = ingest::read_samples_from_path(path, &mut diagnostics)?;
    run(&raw, config, diagnostics)
}

/// Analyze a recording from any buffered reader
pub fn analyze_reader<R: BufRead>(
    reader: R,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let mut diagnostics = Diagnostics::new();
    let raw = ingest::read_samples(reader, &mut diagnostics)?;
    run(&raw, config, diagnostics)
}

/// Analyze an in-memory recording
pub fn analyze_str(text: &str, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    let mut diagnostics = Diagnostics::new();
    let raw = ingest::parse_samples(text, &mut diagnostics);
    run(&raw, config, diagnostics)
}

fn run(
    raw: &[RawSample],
    config: &AnalysisConfig,
    mut diagnostics: Diagnostics,
) -> Result<Analysis, AnalysisError> {
    if raw.is_empty() {
        return Err(DataShortfall::NoValidSamples.into());
    }

    let pressures = Calibration::new(&config.calibration).calibrate_all(raw);
    let flow = Venturi::new(&config.venturi).reconstruct(&pressures, &mut diagnostics)?;
    let times = flow.times();
    let flows = flow.flows();

    let detector = BreathDetector::new(config.detector, config.plot);
    let trace = detector.detect(&times, &flows)?;
    let breath_times = trace.breath_times();

    let stats = metrics::breath_analysis(&breath_times, flow.duration, config.apnea_gap_s)?;
    let leakage = metrics::leakage(&times, &flows, &mut diagnostics);
    let visualization = chart_or_warning(detector.render(&trace, &times), &mut diagnostics);

    tracing::info!(
        duration = flow.duration,
        breaths = stats.breaths,
        bpm = stats.breath_rate_bpm,
        apneas = stats.apnea_count,
        leakage,
        "Analysis complete"
    );

    Ok(Analysis {
        metrics: MetricsRecord {
            duration: flow.duration,
            breaths: stats.breaths,
            breath_rate_bpm: stats.breath_rate_bpm,
            breath_times,
            apnea_count: stats.apnea_count,
            leakage,
            flow_inversions: flow.inversions,
            visualization,
        },
        diagnostics,
    })
}

/// The chart is a side product; a rendering failure leaves the record
/// without an image and is reported as a warning
fn chart_or_warning(
    rendered: Result<Visualization, AnalysisError>,
    diagnostics: &mut Diagnostics,
) -> Visualization {
    match rendered {
        Ok(visualization) => visualization,
        Err(e) => {
            diagnostics.push(
                None,
                DiagnosticKind::RenderFailed {
                    message: e.to_string(),
                },
            );
            Visualization::default()
        }
    }
}

//! cpapflow - CPAP recording analysis
//!
//! This library re-exports the signal processing pipeline from
//! `cpapflow-core` and adds the result-file writer used by the command line
//! driver ([`output`]).

pub mod output;

pub use cpapflow_core::config;
pub use cpapflow_core::report;
pub use cpapflow_core::signal;

pub use cpapflow_core::{analyze_path, analyze_reader, analyze_str, Analysis};
pub use cpapflow_core::{AnalysisConfig, AnalysisError, DataShortfall};
pub use cpapflow_core::{Diagnostic, DiagnosticKind, Diagnostics};
pub use cpapflow_core::{BreathDetector, MetricsRecord, Visualization};
pub use cpapflow_core::{BUILD_DATE, VERSION};

//! Per-run diagnostics sink
//!
//! Every analysis run owns one [`Diagnostics`] value. Entries are also
//! mirrored to `tracing` so a subscriber installed by the caller sees them,
//! but nothing here touches process-wide state.

use serde::{Deserialize, Serialize};

/// What went wrong (or looked suspicious) during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Row did not have the expected number of fields
    MissingData { fields: usize },
    /// Row contained a token that is not a finite number (including `NaN`)
    NonNumericEntry { token: String },
    /// Integrated flow came out negative
    NegativeLeakage { liters: f64 },
    /// Venturi radicand was negative and the flow was clamped to zero
    FlowInversion { t: f64, radicand_pa: f64 },
    /// Flow chart could not be rendered; the record carries no image
    RenderFailed { message: String },
}

impl DiagnosticKind {
    /// Warnings are surfaced to the caller; row rejections are routine
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::NegativeLeakage { .. }
                | DiagnosticKind::FlowInversion { .. }
                | DiagnosticKind::RenderFailed { .. }
        )
    }
}

/// A single diagnostic entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line in the input, when the entry refers to a row
    pub line: Option<usize>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

/// Diagnostics collected over one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and emit the matching tracing event
    pub fn push(&mut self, line: Option<usize>, kind: DiagnosticKind) {
        match &kind {
            DiagnosticKind::MissingData { fields } => {
                tracing::error!(line = ?line, fields, "Missing data");
            }
            DiagnosticKind::NonNumericEntry { token } => {
                tracing::error!(line = ?line, token = %token, "Non-numerical entry");
            }
            DiagnosticKind::NegativeLeakage { liters } => {
                tracing::warn!(liters, "Negative leakage");
            }
            DiagnosticKind::FlowInversion { t, radicand_pa } => {
                tracing::debug!(t, radicand_pa, "Flow inversion clamped to zero");
            }
            DiagnosticKind::RenderFailed { message } => {
                tracing::warn!(error = %message, "Flow chart rendering failed");
            }
        }
        self.entries.push(Diagnostic { line, kind });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of input rows that were discarded
    pub fn rejected_rows(&self) -> usize {
        self.entries.iter().filter(|d| !d.kind.is_warning()).count()
    }

    /// Entries the caller should surface (negative leakage, clamped flow)
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.kind.is_warning())
    }

    pub fn has_negative_leakage(&self) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::NegativeLeakage { .. }))
    }
}

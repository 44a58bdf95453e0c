//! Result files written next to each analyzed recording
//!
//! One JSON document per recording holding the metrics record, the warnings
//! raised during the run and a generation timestamp. The chart can also be
//! written out as a standalone PNG.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cpapflow_core::{Analysis, Diagnostic, MetricsRecord};

/// Contents of `<stem>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFile {
    /// Recording the metrics were computed from
    pub source: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub metrics: MetricsRecord,
    /// Rows discarded during ingestion
    pub rejected_rows: usize,
    pub warnings: Vec<Diagnostic>,
}

impl ResultFile {
    pub fn new(source: &Path, analysis: &Analysis) -> Self {
        Self {
            source: source.to_path_buf(),
            generated_at: Utc::now(),
            metrics: analysis.metrics.clone(),
            rejected_rows: analysis.diagnostics.rejected_rows(),
            warnings: analysis.diagnostics.warnings().cloned().collect(),
        }
    }
}

/// File stem used for the outputs of `source`
fn stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string())
}

/// Output stems for a batch of recordings, one per source
///
/// Sources sharing a file stem (`a/p.txt`, `b/p.txt`) would overwrite each
/// other's results, so repeats get a numeric suffix: `p`, `p_2`, `p_3`.
pub fn output_stems(sources: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let base = stem(source);
            let mut candidate = base.clone();
            let mut n = 1;
            while !used.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{}_{}", base, n);
            }
            candidate
        })
        .collect()
}

/// Write `<stem>.json` (and `<stem>.png` if requested) into `out_dir`
///
/// The stem is taken from `source`. Returns the paths written.
pub fn write_results(
    out_dir: &Path,
    source: &Path,
    analysis: &Analysis,
    write_png: bool,
) -> Result<Vec<PathBuf>> {
    write_results_as(out_dir, &stem(source), source, analysis, write_png)
}

/// Like [`write_results`] with an explicit output stem
pub fn write_results_as(
    out_dir: &Path,
    stem: &str,
    source: &Path,
    analysis: &Analysis,
    write_png: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();

    let json_path = out_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(&ResultFile::new(source, analysis))?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    tracing::info!(path = %json_path.display(), "Metrics written");
    written.push(json_path);

    if write_png {
        let png_path = out_dir.join(format!("{}.png", stem));
        std::fs::write(&png_path, analysis.metrics.visualization.png())
            .with_context(|| format!("Failed to write {}", png_path.display()))?;
        tracing::info!(path = %png_path.display(), "Flow chart written");
        written.push(png_path);
    }

    Ok(written)
}

// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records every candidate's held-out score to a CSV file after
// each training run, so runs can be compared later.
//
// Rows recorded per candidate:
//   - run_at:   when the training run finished (local time)
//   - model:    the candidate's display name
//   - r2:       R² on the held-out test split
//   - selected: true for the candidate that was persisted
//
// Output file: models/metrics.csv
//
// Example CSV output:
//   run_at,model,r2,selected
//   2024-05-01T10:12:03,Linear Regression,0.781234,false
//   2024-05-01T10:12:03,Random Forest,0.874512,true
//
// The file is appended to across runs; the header is written
// only when the file is created. A run with no acceptable
// model still logs its scores (all with selected=false).

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::domain::error::{PipelineError, PipelineResult};

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of the metrics file
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMetrics {
    pub model:    String,
    /// Held-out R²; NaN when the candidate failed to fit
    pub r2:       f64,
    pub selected: bool,
}

impl CandidateMetrics {
    pub fn new(model: impl Into<String>, r2: f64, selected: bool) -> Self {
        Self { model: model.into(), r2, selected }
    }
}

/// Appends candidate scores to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> PipelineResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path).map_err(|e| PipelineError::io(&csv_path, e))?;
            writeln!(f, "run_at,model,r2,selected").map_err(|e| PipelineError::io(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row per candidate, all stamped with the same time.
    pub fn log_run(&self, rows: &[CandidateMetrics]) -> PipelineResult<()> {
        let run_at = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();

        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| PipelineError::io(&self.csv_path, e))?;

        for m in rows {
            // Model names are fixed identifiers without commas
            writeln!(f, "{},{},{:.6},{}", run_at, m.model, m.r2, m.selected)
                .map_err(|e| PipelineError::io(&self.csv_path, e))?;
        }

        tracing::debug!("Logged {} candidate scores to '{}'", rows.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

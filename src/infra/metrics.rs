// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per training epoch.
//
// Metrics recorded per epoch:
//   - epoch:          the epoch number (0-based, as printed)
//   - train_loss:     example-weighted mean training loss
//   - learning_rate:  learning rate at the end of the epoch
//   - sample_prob:    scheduled-sampling probability used
//   - Bleu_4, METEOR, ROUGE_L, CIDEr: validation scores
//   - weighted:       the blended selection score
//   - improved:       whether the epoch produced a new checkpoint
//
// Output file: <saves>/<run>-metrics.csv
//
// Example CSV output:
//   epoch,train_loss,learning_rate,sample_prob,Bleu_4,METEOR,ROUGE_L,CIDEr,weighted,improved
//   0,3.812400,0.000400,0.000000,0.351200,0.262100,0.581000,0.382000,2.012318,true
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::traits::Scores;

const HEADER: &str =
    "epoch,train_loss,learning_rate,sample_prob,Bleu_4,METEOR,ROUGE_L,CIDEr,weighted,improved";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:         usize,
    pub train_loss:    f64,
    pub learning_rate: f64,
    pub sample_prob:   f64,
    pub scores:        Scores,
    pub weighted:      f64,
    pub improved:      bool,
}

impl EpochMetrics {
    fn score(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(f64::NAN)
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs under one name append to the same file.
    pub fn new(dir: &Path, run_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join(format!("{run_name}-metrics.csv"));

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            m.epoch,
            m.train_loss,
            m.learning_rate,
            m.sample_prob,
            m.score("Bleu_4"),
            m.score("METEOR"),
            m.score("ROUGE_L"),
            m.score("CIDEr"),
            m.weighted,
            m.improved,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, weighted={:.4}",
            m.epoch,
            m.train_loss,
            m.weighted,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

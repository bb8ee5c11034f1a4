// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's NamedMpkGzFileRecorder
// at full precision.
//
// What gets saved:
//   1. Model weights (.mpk.gz)  — all learned parameters
//   2. Sidecar (.mpk.gz stem + .json) — epoch, validation scores
//      and the CaptionModelConfig needed to rebuild the network
//   3. <run>-config.json        — the full TrainConfig of the run
//
// Why a sidecar per checkpoint?
//   `test --checkpoint` restores a model without any training
//   arguments. The sidecar carries the architecture, so the
//   model can be rebuilt before the weights are loaded into it.
//
// File naming convention:
//   saves/
//     <run>-best.mpk.gz     ← weights of the best validation epoch
//     <run>-best.json       ← sidecar
//     <run>-config.json     ← training configuration
//     <run>-metrics.csv     ← see metrics.rs
//
// Burn's NamedMpkGzFileRecorder<FullPrecisionSettings>:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip (the same .mpk.gz files as CompactRecorder)
//   - Keeps f32 weights as f32, so the reloaded best model is the
//     exact snapshot that won validation
//   - Type-safe: loading fails if architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::traits::Scores;
use crate::ml::model::{CaptionModelConfig, SemanticCaptioner};

const RECORD_SUFFIX: &str = ".mpk.gz";

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Everything needed to restore and describe a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch:          usize,
    pub weighted_score: f64,
    pub scores:         Scores,
    pub model:          CaptionModelConfig,
}

/// Manages the checkpoints of one named run.
pub struct CheckpointManager {
    /// Directory where checkpoints are stored
    dir:      PathBuf,
    run_name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, run_name: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create saves directory '{}'", dir.display()))?;
        Ok(Self { dir, run_name: run_name.into() })
    }

    /// Record path (without extension) of the best checkpoint.
    pub fn best_path(&self) -> PathBuf {
        self.dir.join(format!("{}-best", self.run_name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights and sidecar as the run's best checkpoint,
    /// replacing the previous best. Returns the record path.
    pub fn save_best<B: Backend>(
        &self,
        model: &SemanticCaptioner<B>,
        meta:  &CheckpointMeta,
    ) -> Result<PathBuf> {
        let path = self.best_path();

        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let sidecar = sidecar_path(&path);
        fs::write(&sidecar, serde_json::to_string_pretty(meta)?)
            .with_context(|| format!("Failed to write '{}'", sidecar.display()))?;

        tracing::debug!("Saved checkpoint: epoch {} → '{}'", meta.epoch, path.display());
        Ok(path)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(format!("{}-config.json", self.run_name));
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

/// Restore a checkpoint from its record path. Accepts the path with or
/// without the `.mpk.gz` suffix.
pub fn load_checkpoint<B: Backend>(
    path:   impl AsRef<Path>,
    device: &B::Device,
) -> Result<(SemanticCaptioner<B>, CheckpointMeta)> {
    let path = record_stem(path.as_ref());
    let meta = load_meta(&path)?;

    let record = CheckpointRecorder::new()
        .load(path.clone(), device)
        .with_context(|| {
            format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                path.display())
        })?;

    let model = meta.model.init::<B>(device).load_record(record);
    tracing::info!(
        "Restored checkpoint '{}' (epoch {}, weighted score {:.4})",
        path.display(),
        meta.epoch,
        meta.weighted_score
    );
    Ok((model, meta))
}

/// Read the sidecar of a record path.
pub fn load_meta(path: &Path) -> Result<CheckpointMeta> {
    let sidecar = sidecar_path(&record_stem(path));
    let json = fs::read_to_string(&sidecar)
        .with_context(|| format!("Cannot read checkpoint sidecar '{}'", sidecar.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed checkpoint sidecar '{}'", sidecar.display()))
}

fn record_stem(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_suffix(RECORD_SUFFIX) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}

// Appends rather than replacing an extension: run names may contain dots.
fn sidecar_path(stem: &Path) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_owned();
    s.push(".json");
    PathBuf::from(s)
}

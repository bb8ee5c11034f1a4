// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load corpus, features, references   (Layer 4 - data)
//   Step 2: Prepare the saves directory          (Layer 6 - infra)
//   Step 3: Save config                          (Layer 6 - infra)
//   Step 4: Train, select by validation score,
//           score the best checkpoint on test    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::context::{DataPaths, RunContext};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::DecodeMode;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so the
// run's settings are saved next to its checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Namespaces checkpoints, metrics and the caption log
    pub run_name:        String,
    pub data:            DataPaths,
    pub saves_dir:       String,
    /// Scorer command line; the metric name is appended per call
    pub scorer:          String,
    pub decode_mode:     DecodeMode,
    pub epochs:          usize,
    pub batch_size:      usize,
    /// Decoding length for validation / test captions
    pub n_steps:         usize,
    pub factor_dim:      usize,
    pub hidden_dim:      usize,
    pub dropout:         f64,
    pub lr:              f64,
    pub decay_steps:     usize,
    pub decay_rate:      f64,
    /// Scheduled-sampling probability gained per epoch
    pub sample_rate:     f64,
    pub seed:            u64,
    pub eval_batch_size: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            run_name:        "1".to_string(),
            data:            DataPaths::default(),
            saves_dir:       "saves".to_string(),
            scorer:          "caption-eval".to_string(),
            decode_mode:     DecodeMode::Argmax,
            epochs:          50,
            batch_size:      64,
            n_steps:         20,
            factor_dim:      1024,
            hidden_dim:      1024,
            dropout:         0.5,
            lr:              4e-4,
            decay_steps:     20350,
            decay_rate:      0.316,
            sample_rate:     0.008,
            seed:            123,
            eval_batch_size: 128,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load every input once ─────────────────────────────────────
        tracing::info!("Loading inputs for run '{}'", cfg.run_name);
        let ctx = RunContext::load(&cfg.data, &cfg.scorer, &cfg.run_name)?;
        tracing::info!(
            "{} training captions over {} videos",
            ctx.train_size(),
            ctx.features.num_videos()
        );

        // ── Step 2: Saves directory and metrics CSV ───────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.saves_dir, &cfg.run_name)?;
        let metrics      = MetricsLogger::new(ckpt_manager.dir(), &cfg.run_name)?;

        // ── Step 3: Save config next to the checkpoints ───────────────────────
        ckpt_manager.save_config(cfg)?;

        // ── Step 4: Train (Layer 5) ───────────────────────────────────────────
        let outcome = run_training(cfg, &ctx, &ckpt_manager, &metrics)?;
        tracing::info!(
            "Best epoch {} (weighted {:.4}); test weighted {:.4}",
            outcome.best_epoch,
            outcome.best_val_score,
            outcome.test_score
        );

        Ok(())
    }
}

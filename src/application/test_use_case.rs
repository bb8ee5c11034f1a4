// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// The test-only path: no training. Restore a saved checkpoint,
// decode the test split, score it and write the caption log.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::context::{DataPaths, RunContext};
use crate::ml::evaluator::{run_test_only, EvalSettings};
use crate::ml::model::DecodeMode;

type EvalBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub run_name:        String,
    pub data:            DataPaths,
    pub scorer:          String,
    /// Record path of the checkpoint, with or without `.mpk.gz`
    pub checkpoint:      String,
    pub decode_mode:     DecodeMode,
    pub n_steps:         usize,
    pub eval_batch_size: usize,
}

pub struct TestUseCase {
    config: TestConfig,
}

impl TestUseCase {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        let ctx = RunContext::load(&cfg.data, &cfg.scorer, &cfg.run_name)?;

        let settings = EvalSettings {
            n_steps:    cfg.n_steps,
            mode:       cfg.decode_mode,
            batch_size: cfg.eval_batch_size,
        };
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        let evaluation = run_test_only::<EvalBackend>(&cfg.checkpoint, &ctx, &settings, &device)?;

        tracing::info!(
            "Scored {} test captions; log written to '{}'",
            evaluation.captions.len(),
            ctx.output_log.display()
        );
        Ok(())
    }
}

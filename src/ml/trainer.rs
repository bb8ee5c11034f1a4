// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Per epoch:
//   1. sample_prob = epoch × sample_rate
//   2. shuffle training captions, walk them in batch_size chunks
//      (plus the short remainder chunk)
//   3. forward with scheduled sampling → Adam step at the
//      staircase-decayed learning rate
//   4. decode + score the validation split on the inner backend
//   5. save `<run>-best` iff the weighted score strictly improves
//
// After the last epoch the best checkpoint is restored and the
// test split is scored once.
//
// Key Burn 0.16 insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend with
//     dropout disabled; evaluation runs there
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::PathBuf;

use anyhow::{bail, ensure, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::context::RunContext;
use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::assemble_batch, decode, epoch::EpochPlanner};
use crate::domain::checkpoint_policy::{weighted_score, BestScoreTracker};
use crate::domain::corpus::Phase;
use crate::domain::schedule::{sample_probability, LrSchedule};
use crate::infra::checkpoint::{load_checkpoint, CheckpointManager, CheckpointMeta};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::{evaluate_phase, tensor_to_tokens, EvalSettings, PhaseEvaluation};
use crate::ml::model::SemanticCaptioner;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Training predictions printed every tenth epoch.
const SAMPLE_LOG_COUNT: usize = 10;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_epoch:      usize,
    pub best_val_score:  f64,
    pub best_checkpoint: PathBuf,
    pub test:            PhaseEvaluation,
    pub test_score:      f64,
}

pub fn run_training(
    cfg:          &TrainConfig,
    ctx:          &RunContext,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainingOutcome> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, ctx, ckpt_manager, metrics, &device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    ctx:          &RunContext,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       &B::Device,
) -> Result<TrainingOutcome> {
    ensure!(ctx.train_size() > 0, "corpus has no training captions");
    ensure!(cfg.batch_size > 0, "batch size must be positive");

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = ctx.model_config(cfg.factor_dim, cfg.hidden_dim, cfg.dropout);
    let mut model: SemanticCaptioner<B> = model_cfg
        .init(device)
        .with_pretrained_embeddings(&ctx.corpus.embeddings)?;
    tracing::info!(
        "Model ready: vocab={}, hidden={}, factor={}",
        model_cfg.vocab_size,
        model_cfg.hidden_dim,
        model_cfg.factor_dim
    );
    println!("decode mode: {:?}", cfg.decode_mode);

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
    let schedule  = LrSchedule::new(cfg.lr, cfg.decay_steps, cfg.decay_rate);
    let settings  = EvalSettings {
        n_steps:    cfg.n_steps,
        mode:       cfg.decode_mode,
        batch_size: cfg.eval_batch_size,
    };

    let mut planner   = EpochPlanner::new(ctx.train_size(), cfg.batch_size, cfg.seed);
    let mut tracker   = BestScoreTracker::new();
    let mut best_path = None;
    let mut step      = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {
        let sample_prob = sample_probability(epoch, cfg.sample_rate);
        let log_samples = epoch % 10 == 9;
        let plan        = planner.next_epoch();

        let mut loss_sum = 0.0f64;
        let mut samples: Vec<(usize, Vec<u32>)> = Vec::new();

        for indices in plan.batches() {
            let batch   = assemble_batch(&ctx.corpus.train, indices, &ctx.features)?;
            let tensors = batch.to_tensors::<B>(device);

            let (loss, preds) = model.forward_loss(
                tensors.words,
                tensors.mask,
                tensors.videos,
                tensors.tags,
                sample_prob,
                cfg.decode_mode,
            );

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val * indices.len() as f64;

            if log_samples && samples.len() < SAMPLE_LOG_COUNT {
                let [_, steps] = preds.dims();
                let flat = tensor_to_tokens(preds)?;
                samples.extend(
                    indices
                        .iter()
                        .copied()
                        .zip(decode::rows(&flat, steps))
                        .take(SAMPLE_LOG_COUNT - samples.len()),
                );
            }

            // Backward pass + Adam update
            let lr    = schedule.learning_rate(step);
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
            step += 1;
        }

        let train_loss = loss_sum / ctx.train_size() as f64;
        println!("Epoch {epoch:3}: Train Loss {train_loss:.5}");
        if log_samples {
            print_train_samples(ctx, &samples);
        }

        // ── Validation + checkpoint selection ─────────────────────────────────
        let val      = evaluate_phase(&model.valid(), ctx, Phase::Val, &settings, device)?;
        let weighted = weighted_score(&val.scores);
        let improved = tracker.observe(epoch, weighted);

        if improved {
            let meta = CheckpointMeta {
                epoch,
                weighted_score: weighted,
                scores:         val.scores.clone(),
                model:          model_cfg.clone(),
            };
            let path = ckpt_manager.save_best(&model, &meta)?;
            println!("Epoch {epoch}: the best model has been saved as {}.", path.display());
            best_path = Some(path);
        }

        metrics.log(&EpochMetrics {
            epoch,
            train_loss,
            learning_rate: schedule.learning_rate(step.saturating_sub(1)),
            sample_prob,
            scores: val.scores,
            weighted,
            improved,
        })?;
    }

    // ── Test the best checkpoint ──────────────────────────────────────────────
    let Some(best_path) = best_path else {
        bail!("no epoch reached a positive validation score; no checkpoint to test");
    };
    let (best, meta) = load_checkpoint::<B::InnerBackend>(&best_path, device)?;
    let test = evaluate_phase(&best, ctx, Phase::Test, &settings, device)?;
    let test_score = weighted_score(&test.scores);

    tracing::info!("Training complete!");
    Ok(TrainingOutcome {
        best_epoch:      meta.epoch,
        best_val_score:  tracker.best(),
        best_checkpoint: best_path,
        test,
        test_score,
    })
}

/// Ground truth next to prediction for a few training captions.
fn print_train_samples(ctx: &RunContext, samples: &[(usize, Vec<u32>)]) {
    let vocab = &ctx.corpus.idx2word;
    for (idx, pred) in samples {
        let truth = vocab.words_for(&ctx.corpus.train.captions[*idx]).join(" ");
        let pred  = decode::words_through_eos(pred, vocab).join(" ");
        println!("train {idx} {truth} \t\t {pred}");
    }
    println!();
}

// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Decodes one caption per video of a phase and scores the
// captions against the human references.
//
//   for each chunk of video ids in the phase range:
//       gather video + tag rows
//       model.generate(...)  (n_steps tokens, no ground truth)
//   truncate each caption at the first EOS, map ids → words
//   score with every CaptionScorer, merge into one map
//   print the scores, rewrite <run>_output.log
//
// Chunking only batches the forward passes; each video's caption
// is computed independently of its neighbours.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::application::context::RunContext;
use crate::data::{batcher::gather_videos, decode};
use crate::domain::corpus::Phase;
use crate::domain::scoring::score_captions;
use crate::domain::traits::{Hypotheses, Scores};
use crate::infra::caption_log::write_caption_log;
use crate::infra::checkpoint::load_checkpoint;
use crate::ml::model::{DecodeMode, SemanticCaptioner};

/// Decoding knobs shared by validation and test.
#[derive(Debug, Clone, Copy)]
pub struct EvalSettings {
    pub n_steps:    usize,
    pub mode:       DecodeMode,
    pub batch_size: usize,
}

/// Captions and scores for one phase.
#[derive(Debug, Clone)]
pub struct PhaseEvaluation {
    pub phase:    Phase,
    /// (video id, caption) in video-id order
    pub captions: Vec<(usize, String)>,
    pub scores:   Scores,
}

/// Decode every video of `phase`.
pub fn decode_phase<B: Backend>(
    model:    &SemanticCaptioner<B>,
    ctx:      &RunContext,
    phase:    Phase,
    settings: &EvalSettings,
    device:   &B::Device,
) -> Result<Vec<(usize, String)>> {
    ensure!(settings.batch_size > 0, "evaluation batch size must be positive");

    let video_ids: Vec<usize> = phase.video_range().collect();
    let mut captions = Vec::with_capacity(video_ids.len());

    for chunk in video_ids.chunks(settings.batch_size) {
        let (videos, tags) = gather_videos(chunk, &ctx.features)?;
        let videos = Tensor::<B, 2>::from_data(
            TensorData::new(videos, [chunk.len(), ctx.features.video_dim()]), device,
        );
        let tags = Tensor::<B, 2>::from_data(
            TensorData::new(tags, [chunk.len(), ctx.features.tag_dim()]), device,
        );

        let words = model.generate(videos, tags, settings.n_steps, settings.mode);
        let flat  = tensor_to_tokens(words)?;

        for (&vid, tokens) in chunk.iter().zip(decode::rows(&flat, settings.n_steps)) {
            captions.push((vid, decode::caption_text(&tokens, &ctx.corpus.idx2word)));
        }
        // n_steps == 0 yields no rows; every video still gets an empty caption
        if settings.n_steps == 0 {
            captions.extend(chunk.iter().map(|&vid| (vid, String::new())));
        }
    }

    tracing::debug!("Decoded {} {} captions", captions.len(), phase);
    Ok(captions)
}

/// Decode, score, print and log one phase.
pub fn evaluate_phase<B: Backend>(
    model:    &SemanticCaptioner<B>,
    ctx:      &RunContext,
    phase:    Phase,
    settings: &EvalSettings,
    device:   &B::Device,
) -> Result<PhaseEvaluation> {
    let captions = decode_phase(model, ctx, phase, settings, device)?;

    let refs = ctx.references.for_phase(phase)?;
    let hypo: Hypotheses = captions
        .iter()
        .map(|(vid, caption)| (*vid, vec![caption.clone()]))
        .collect();

    let scores = score_captions(&ctx.scorers, &refs, &hypo)
        .with_context(|| format!("Scoring {phase} captions failed"))?;

    print_scores(phase, &scores);
    write_caption_log(&ctx.output_log, captions.iter().map(|(_, c)| c.as_str()))?;

    Ok(PhaseEvaluation { phase, captions, scores })
}

/// Restore `checkpoint` and score it on the test split.
pub fn run_test_only<B: Backend>(
    checkpoint: impl AsRef<Path>,
    ctx:        &RunContext,
    settings:   &EvalSettings,
    device:     &B::Device,
) -> Result<PhaseEvaluation> {
    let (model, meta) = load_checkpoint::<B>(checkpoint, device)?;
    ctx.check_model(&meta.model)?;
    evaluate_phase(&model, ctx, Phase::Test, settings, device)
}

pub(crate) fn tensor_to_tokens<B: Backend>(words: Tensor<B, 2, Int>) -> Result<Vec<u32>> {
    let ids = words
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow::anyhow!("Cannot read decoded tokens: {e:?}"))?;
    Ok(ids.into_iter().map(|w| w as u32).collect())
}

/// Scores to stdout, one metric per line in name order.
pub fn print_scores(phase: Phase, scores: &Scores) {
    println!("{phase} scores:");
    for (name, value) in scores {
        println!("  {name:<8} {value:.5}");
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::testing::tiny_context;
    use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
    use crate::ml::model::CaptionModelConfig;
    use burn::backend::NdArray;
    use std::path::PathBuf;

    type B = NdArray;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scn_eval_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn settings(batch_size: usize) -> EvalSettings {
        EvalSettings { n_steps: 3, mode: DecodeMode::Argmax, batch_size }
    }

    fn save(dir: &Path, model_cfg: CaptionModelConfig) -> PathBuf {
        let device = Default::default();
        let model  = model_cfg.init::<B>(&device);
        let meta   = CheckpointMeta {
            epoch:          4,
            weighted_score: 1.0,
            scores:         Scores::new(),
            model:          model_cfg,
        };
        CheckpointManager::new(dir, "eval").unwrap().save_best(&model, &meta).unwrap()
    }

    #[test]
    fn test_run_test_only_scores_saved_checkpoint() {
        let dir = temp_dir("test_only");
        let ctx = tiny_context(&dir);
        let path = save(&dir, ctx.model_config(4, 4, 0.0));

        let eval = run_test_only::<B>(&path, &ctx, &settings(512), &Default::default()).unwrap();

        let test_videos = Phase::Test.video_range().len();
        assert_eq!(eval.phase, Phase::Test);
        assert_eq!(eval.captions.len(), test_videos);
        assert_eq!(eval.captions.first().map(|c| c.0), Some(7010));
        assert_eq!(eval.captions.last().map(|c| c.0), Some(9999));
        assert_eq!(eval.scores["METEOR"], 0.25);
        assert_eq!(eval.scores["ROUGE_L"], 0.5);

        let log = std::fs::read_to_string(&ctx.output_log).unwrap();
        assert_eq!(log.lines().count(), test_videos);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_run_test_only_rejects_checkpoint_for_other_data() {
        let dir = temp_dir("mismatch");
        let ctx = tiny_context(&dir);

        let mut other = ctx.model_config(4, 4, 0.0);
        other.vocab_size += 1;
        let path = save(&dir, other);

        assert!(run_test_only::<B>(&path, &ctx, &settings(512), &Default::default()).is_err());
        assert!(!ctx.output_log.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_captions_independent_of_eval_batch_size() {
        let dir    = temp_dir("chunking");
        let ctx    = tiny_context(&dir);
        let device = Default::default();
        let model  = ctx.model_config(4, 4, 0.0).init::<B>(&device);

        let one  = decode_phase(&model, &ctx, Phase::Val, &settings(1), &device).unwrap();
        let many = decode_phase(&model, &ctx, Phase::Val, &settings(512), &device).unwrap();

        assert_eq!(one.len(), Phase::Val.video_range().len());
        assert_eq!(one, many);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_eval_batch_size_is_error() {
        let dir    = temp_dir("zero_batch");
        let ctx    = tiny_context(&dir);
        let device = Default::default();
        let model  = ctx.model_config(4, 4, 0.0).init::<B>(&device);
        assert!(decode_phase(&model, &ctx, Phase::Val, &settings(0), &device).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}

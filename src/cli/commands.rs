// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `test`, and their
// flags. Options shared by both (input files, scorer, decoding)
// live in flattened argument groups.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::context::DataPaths;
use crate::application::test_use_case::TestConfig;
use crate::application::train_use_case::TrainConfig;
use crate::ml::model::DecodeMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train, keep the best validation checkpoint, then score it on test
    Train(TrainArgs),

    /// Score a saved checkpoint on the test split without training
    Test(TestArgs),
}

/// Input files of a run.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Corpus bundle: captions, video ids, vocabulary, embeddings (JSON)
    #[arg(long, default_value = "data/msrvtt_corpus.json")]
    pub corpus: String,

    /// Per-video visual features, one row per video id (.npy)
    #[arg(long, default_value = "data/msrvtt_resnext_eco_feats.npy")]
    pub video_feats: String,

    /// Per-video semantic tag probabilities (.npy)
    #[arg(long, default_value = "data/msrvtt_e100_tag_feats.npy")]
    pub tag_feats: String,

    /// Reference captions per split (JSON)
    #[arg(long, default_value = "data/msrvtt_ref.json")]
    pub refs: String,

    /// Scorer command; the metric name (bleu, meteor, rouge, cider)
    /// is appended as the last argument of each call
    #[arg(long, default_value = "caption-eval")]
    pub scorer: String,
}

impl From<DataArgs> for DataPaths {
    fn from(a: DataArgs) -> Self {
        DataPaths {
            corpus:      a.corpus,
            video_feats: a.video_feats,
            tag_feats:   a.tag_feats,
            refs:        a.refs,
        }
    }
}

/// Decoding options shared by training-time evaluation and `test`.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Sample each word from the softmax instead of taking the argmax
    #[arg(long)]
    pub sample: bool,

    /// Number of words decoded per caption
    #[arg(long, default_value_t = 20)]
    pub n_steps: usize,

    /// Videos decoded together during evaluation
    #[arg(long, default_value_t = 128)]
    pub eval_batch_size: usize,
}

impl DecodeArgs {
    fn mode(&self) -> DecodeMode {
        if self.sample { DecodeMode::Sample } else { DecodeMode::Argmax }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Run name; prefixes checkpoints, metrics and the caption log
    #[arg(long, default_value = "1")]
    pub name: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub decode: DecodeArgs,

    /// Directory for checkpoints, config and metrics
    #[arg(long, default_value = "saves")]
    pub saves_dir: String,

    /// Number of full passes through the training captions
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Training captions per batch
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// LSTM hidden size
    #[arg(long, default_value_t = 1024)]
    pub hidden_dim: usize,

    /// Width of the tag factor layer
    #[arg(long, default_value_t = 1024)]
    pub factor_dim: usize,

    /// Dropout probability on the LSTM output
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 4e-4)]
    pub lr: f64,

    /// Optimiser steps between learning-rate decays (0 disables decay)
    #[arg(long, default_value_t = 20350)]
    pub decay_steps: usize,

    /// Factor applied at every decay
    #[arg(long, default_value_t = 0.316)]
    pub decay_rate: f64,

    /// Scheduled-sampling probability added per epoch
    #[arg(long, default_value_t = 0.008)]
    pub sample_rate: f64,

    /// Seed for the caption shuffle
    #[arg(long, default_value_t = 123)]
    pub seed: u64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let decode_mode = a.decode.mode();
        TrainConfig {
            run_name:        a.name,
            scorer:          a.data.scorer.clone(),
            data:            a.data.into(),
            saves_dir:       a.saves_dir,
            decode_mode,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            n_steps:         a.decode.n_steps,
            factor_dim:      a.factor_dim,
            hidden_dim:      a.hidden_dim,
            dropout:         a.dropout,
            lr:              a.lr,
            decay_steps:     a.decay_steps,
            decay_rate:      a.decay_rate,
            sample_rate:     a.sample_rate,
            seed:            a.seed,
            eval_batch_size: a.decode.eval_batch_size,
        }
    }
}

/// All arguments for the `test` command.
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Checkpoint record path, e.g. saves/1-best
    #[arg(long)]
    pub checkpoint: String,

    /// Run name; the caption log is written to <name>_output.log
    #[arg(long, default_value = "1")]
    pub name: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub decode: DecodeArgs,
}

impl From<TestArgs> for TestConfig {
    fn from(a: TestArgs) -> Self {
        let decode_mode = a.decode.mode();
        TestConfig {
            run_name:        a.name,
            scorer:          a.data.scorer.clone(),
            data:            a.data.into(),
            checkpoint:      a.checkpoint,
            decode_mode,
            n_steps:         a.decode.n_steps,
            eval_batch_size: a.decode.eval_batch_size,
        }
    }
}

// ============================================================
// Layer 2 — Run Context
// ============================================================
// Everything a run reads but never changes, loaded in one step:
//
//   corpus      — training captions, vocabulary, embeddings
//   features    — video + tag feature tables
//   references  — reference captions for scoring
//   scorers     — the four metric scorers
//   output_log  — where decoded captions are written
//
// Training and evaluation receive a &RunContext instead of
// reaching for process-wide state.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    features::VideoFeatures,
    loader::{check_feature_coverage, load_corpus, load_features, load_references},
    references::ReferenceBundle,
};
use crate::domain::corpus::{Corpus, Phase};
use crate::domain::traits::CaptionScorer;
use crate::infra::scorer_process::ExternalScorer;
use crate::ml::model::CaptionModelConfig;

// ─── Input Paths ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    pub corpus:      String,
    pub video_feats: String,
    pub tag_feats:   String,
    pub refs:        String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            corpus:      "data/msrvtt_corpus.json".to_string(),
            video_feats: "data/msrvtt_resnext_eco_feats.npy".to_string(),
            tag_feats:   "data/msrvtt_e100_tag_feats.npy".to_string(),
            refs:        "data/msrvtt_ref.json".to_string(),
        }
    }
}

// ─── RunContext ───────────────────────────────────────────────────────────────
pub struct RunContext {
    pub corpus:     Corpus,
    pub features:   VideoFeatures,
    pub references: ReferenceBundle,
    pub scorers:    Vec<Box<dyn CaptionScorer>>,
    pub output_log: PathBuf,
}

impl RunContext {
    /// Load and cross-check every input of a run.
    pub fn load(paths: &DataPaths, scorer_command: &str, run_name: &str) -> Result<Self> {
        let corpus   = load_corpus(&paths.corpus)?;
        let features = load_features(&paths.video_feats, &paths.tag_feats)?;
        check_feature_coverage(&corpus, &features, Phase::Test.video_range().end)
            .context("Feature arrays do not match the corpus")?;

        let references = load_references(&paths.refs)?;
        // Validate now rather than after the first training epoch.
        references.for_phase(Phase::Val)?;
        references.for_phase(Phase::Test)?;

        let scorers = ExternalScorer::standard_set(scorer_command)?;

        Ok(Self::from_parts(
            corpus,
            features,
            references,
            scorers,
            PathBuf::from(format!("{run_name}_output.log")),
        ))
    }

    pub fn from_parts(
        corpus:     Corpus,
        features:   VideoFeatures,
        references: ReferenceBundle,
        scorers:    Vec<Box<dyn CaptionScorer>>,
        output_log: PathBuf,
    ) -> Self {
        Self { corpus, features, references, scorers, output_log }
    }

    /// Number of training captions.
    pub fn train_size(&self) -> usize {
        self.corpus.train.len()
    }

    /// A restored model must agree with the loaded data.
    pub fn check_model(&self, model: &CaptionModelConfig) -> Result<()> {
        let expected = self.model_config(model.factor_dim, model.hidden_dim, model.dropout);
        ensure!(
            model.vocab_size == expected.vocab_size
                && model.embed_dim == expected.embed_dim
                && model.tag_dim == expected.tag_dim
                && model.video_dim == expected.video_dim,
            "checkpoint was trained for vocab {} / embed {} / tag {} / video {}, \
             data has {} / {} / {} / {}",
            model.vocab_size, model.embed_dim, model.tag_dim, model.video_dim,
            expected.vocab_size, expected.embed_dim, expected.tag_dim, expected.video_dim,
        );
        Ok(())
    }

    /// Model dimensions implied by the data, plus the free hyperparameters.
    pub fn model_config(&self, factor_dim: usize, hidden_dim: usize, dropout: f64) -> CaptionModelConfig {
        CaptionModelConfig::new(
            self.corpus.vocab_size(),
            self.corpus.embed_dim(),
            self.features.tag_dim(),
            self.features.video_dim(),
        )
        .with_factor_dim(factor_dim)
        .with_hidden_dim(hidden_dim)
        .with_dropout(dropout)
    }
}

// ============================================================
// Layer 4 — Input File Loader
// ============================================================
// Reads the four input files of a run:
//
//   corpus bundle  (JSON)  captions, video ids, idx2word, embeddings
//   video features (.npy)  videos × n_z   f32
//   tag features   (.npy)  videos × n_y   f32
//   references     (JSON)  per-phase reference captions
//
// This is an offline batch job: any missing or malformed file,
// or any size mismatch between the files, stops the run with an
// error naming the file. Nothing is skipped or repaired.
//
// Reference: Rust Book §9 (Error Handling)
//            ndarray-npy crate documentation

use std::{fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use ndarray::Array2;
use ndarray_npy::read_npy;

use crate::data::features::VideoFeatures;
use crate::data::references::ReferenceBundle;
use crate::domain::corpus::{CaptionSplit, Corpus};

/// Load and validate the corpus bundle.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Corpus> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus '{}'", path.display()))?;
    let corpus: Corpus = serde_json::from_str(&json)
        .with_context(|| format!("Malformed corpus bundle '{}'", path.display()))?;

    validate_corpus(&corpus)
        .with_context(|| format!("Invalid corpus bundle '{}'", path.display()))?;

    tracing::info!(
        "Loaded corpus: {} training captions, vocabulary {}, embedding dim {}",
        corpus.train.len(),
        corpus.vocab_size(),
        corpus.embed_dim()
    );
    Ok(corpus)
}

/// Load one 2-D f32 feature table.
pub fn load_feature_array(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let array: Array2<f32> = read_npy(path)
        .with_context(|| format!("Cannot read feature array '{}'", path.display()))?;
    tracing::info!(
        "Loaded '{}': {} × {}",
        path.display(),
        array.nrows(),
        array.ncols()
    );
    Ok(array)
}

/// Load video and tag tables and pair them.
pub fn load_features(video: impl AsRef<Path>, tags: impl AsRef<Path>) -> Result<VideoFeatures> {
    VideoFeatures::new(load_feature_array(video)?, load_feature_array(tags)?)
}

pub fn load_references(path: impl AsRef<Path>) -> Result<ReferenceBundle> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read references '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed reference bundle '{}'", path.display()))
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Internal consistency of a corpus bundle.
pub fn validate_corpus(corpus: &Corpus) -> Result<()> {
    ensure!(!corpus.idx2word.is_empty(), "vocabulary is empty");
    ensure!(
        corpus.embeddings.len() == corpus.vocab_size(),
        "vocabulary has {} words but embedding matrix has {} rows",
        corpus.vocab_size(),
        corpus.embeddings.len()
    );

    let dim = corpus.embed_dim();
    ensure!(dim > 0, "embedding dimension is zero");
    if let Some(row) = corpus.embeddings.iter().position(|r| r.len() != dim) {
        bail!("embedding row {row} has {} values, expected {dim}", corpus.embeddings[row].len());
    }

    validate_split("train", &corpus.train, corpus.vocab_size())?;
    if let Some(val) = &corpus.val {
        validate_split("val", val, corpus.vocab_size())?;
    }
    if let Some(test) = &corpus.test {
        validate_split("test", test, corpus.vocab_size())?;
    }
    Ok(())
}

fn validate_split(name: &str, split: &CaptionSplit, vocab_size: usize) -> Result<()> {
    ensure!(
        split.captions.len() == split.video_ids.len(),
        "{name}: {} captions but {} video ids",
        split.captions.len(),
        split.video_ids.len()
    );
    for (i, caption) in split.captions.iter().enumerate() {
        ensure!(!caption.is_empty(), "{name}: caption {i} is empty");
        if let Some(&w) = caption.iter().find(|&&w| w as usize >= vocab_size) {
            bail!("{name}: caption {i} uses token {w} outside vocabulary of {vocab_size}");
        }
    }
    Ok(())
}

/// The feature tables must cover every video the run touches.
pub fn check_feature_coverage(
    corpus:          &Corpus,
    features:        &VideoFeatures,
    required_videos: usize,
) -> Result<()> {
    let available = features.num_videos();
    ensure!(
        available >= required_videos,
        "feature arrays have {available} videos, at least {required_videos} required"
    );
    if let Some(max_id) = corpus.train.max_video_id() {
        ensure!(
            max_id < available,
            "training caption references video {max_id} but features cover {available}"
        );
    }
    Ok(())
}

// ============================================================
// Layer 3 — Corpus Domain Types
// ============================================================
// The caption corpus as the rest of the system sees it:
//
//   CaptionSplit — parallel arrays of token sequences and the
//                  video id each caption describes
//   Vocabulary   — index → word table used to print captions
//   Corpus       — the training split (plus optional val/test
//                  captions), vocabulary and pretrained word
//                  embedding matrix
//   Phase        — which slice of the video id space a step
//                  works on
//
// MSR-VTT is split by video id, not by caption:
//   videos    0 .. 6513   → train
//   videos 6513 .. 7010   → validation
//   videos 7010 .. 10000  → test
//
// Token 0 plays two roles: padding in a batch and end-of-sentence
// in a decoded caption.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Padding and end-of-sentence token.
pub const EOS_TOKEN: u32 = 0;

// ─── Phase ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Train,
    Val,
    Test,
}

impl Phase {
    /// Video ids belonging to this phase.
    pub fn video_range(self) -> Range<usize> {
        match self {
            Phase::Train => 0..6513,
            Phase::Val   => 6513..7010,
            Phase::Test  => 7010..10000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Val   => "val",
            Phase::Test  => "test",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── CaptionSplit ─────────────────────────────────────────────────────────────
/// Tokenised captions and, for each caption, the id of the video it
/// describes. `captions[i]` belongs to video `video_ids[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptionSplit {
    pub captions:  Vec<Vec<u32>>,
    pub video_ids: Vec<usize>,
}

impl CaptionSplit {
    pub fn new(captions: Vec<Vec<u32>>, video_ids: Vec<usize>) -> Self {
        Self { captions, video_ids }
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Largest video id referenced by any caption.
    pub fn max_video_id(&self) -> Option<usize> {
        self.video_ids.iter().copied().max()
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word for a token id; unknown ids render as `<unk>`.
    pub fn word(&self, token: u32) -> &str {
        self.words
            .get(token as usize)
            .map(String::as_str)
            .unwrap_or("<unk>")
    }

    /// Map every token to its word, including any trailing EOS.
    pub fn words_for(&self, tokens: &[u32]) -> Vec<String> {
        tokens.iter().map(|&t| self.word(t).to_string()).collect()
    }

    /// Space-joined sentence for a token sequence.
    pub fn sentence(&self, tokens: &[u32]) -> String {
        tokens
            .iter()
            .map(|&t| self.word(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─── Corpus ───────────────────────────────────────────────────────────────────
/// Everything from the corpus bundle. Only `train` drives optimisation;
/// validation and test scoring iterate over video ids instead of
/// captions, so `val`/`test` are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub train: CaptionSplit,

    #[serde(default)]
    pub val: Option<CaptionSplit>,

    #[serde(default)]
    pub test: Option<CaptionSplit>,

    pub idx2word: Vocabulary,

    /// vocabulary size × embedding dimension
    pub embeddings: Vec<Vec<f32>>,
}

impl Corpus {
    /// Embedding dimension, taken from the first row.
    pub fn embed_dim(&self) -> usize {
        self.embeddings.first().map(Vec::len).unwrap_or(0)
    }

    pub fn vocab_size(&self) -> usize {
        self.idx2word.len()
    }
}

// ============================================================
// Layer 4 — Decoded Caption Helpers
// ============================================================
// The decoder always emits a fixed number of tokens. Everything
// from the first end-of-sentence token (0) onwards is discarded
// before a caption is printed or scored.

use crate::domain::corpus::{Vocabulary, EOS_TOKEN};

/// Tokens before the first EOS.
pub fn truncate_at_eos(tokens: &[u32]) -> &[u32] {
    match tokens.iter().position(|&t| t == EOS_TOKEN) {
        Some(end) => &tokens[..end],
        None      => tokens,
    }
}

/// Decoded caption as a space-joined sentence.
pub fn caption_text(tokens: &[u32], vocab: &Vocabulary) -> String {
    vocab.sentence(truncate_at_eos(tokens))
}

/// Words of a training prediction, keeping the EOS word itself so
/// the log shows where the model stopped.
pub fn words_through_eos(tokens: &[u32], vocab: &Vocabulary) -> Vec<String> {
    let end = tokens
        .iter()
        .position(|&t| t == EOS_TOKEN)
        .map(|p| p + 1)
        .unwrap_or(tokens.len());
    vocab.words_for(&tokens[..end])
}

/// Split a row-major [rows, cols] token buffer into per-row vectors.
pub fn rows(flat: &[u32], cols: usize) -> Vec<Vec<u32>> {
    if cols == 0 {
        return Vec::new();
    }
    flat.chunks(cols).map(<[u32]>::to_vec).collect()
}

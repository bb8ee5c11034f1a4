// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Caption metrics (BLEU, METEOR, ROUGE-L, CIDEr) are not
// computed by this crate. They live in an external toolkit and
// are reached through the CaptionScorer trait, so the evaluation
// code never knows how a score was produced:
//
//   - ExternalScorer (Layer 6) → runs the toolkit as a process
//   - tests                    → fixed-value fakes
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::collections::BTreeMap;

use anyhow::Result;

/// video id → reference captions
pub type References = BTreeMap<usize, Vec<String>>;

/// video id → single-element list holding the decoded caption
pub type Hypotheses = BTreeMap<usize, Vec<String>>;

/// metric name → corpus-level score
pub type Scores = BTreeMap<String, f64>;

// ─── MetricScore ──────────────────────────────────────────────────────────────
/// A scorer returns one value (METEOR) or several (BLEU-1..4).
#[derive(Debug, Clone, PartialEq)]
pub enum MetricScore {
    Single(f64),
    Multi(Vec<f64>),
}

// ─── CaptionScorer ────────────────────────────────────────────────────────────
/// Anything that can score hypotheses against references.
pub trait CaptionScorer {
    /// Names of the values this scorer produces, in output order.
    /// A single-valued scorer has exactly one name.
    fn metric_names(&self) -> &[String];

    /// Corpus-level score. `refs` and `hypo` have identical key sets.
    fn compute_score(&self, refs: &References, hypo: &Hypotheses) -> Result<MetricScore>;
}

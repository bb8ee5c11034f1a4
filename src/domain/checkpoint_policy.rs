// ============================================================
// Layer 3 — Checkpoint Selection Policy
// ============================================================
// After every epoch the validation split is scored and the
// metrics are folded into one number:
//
//   weighted = 1.4·Bleu_4 + 1.17·CIDEr + 2·METEOR + 1·ROUGE_L
//
// (Bleu_1..3 are reported but carry zero weight.)
//
// A checkpoint is written only when this number is STRICTLY
// greater than every earlier epoch's. Ties never save.
//
// Reference: Rust Book §8 (Hash Maps)

use crate::domain::traits::Scores;

/// Metric weights used for model selection.
pub const METRIC_WEIGHTS: [(&str, f64); 7] = [
    ("Bleu_1",  0.0),
    ("Bleu_2",  0.0),
    ("Bleu_3",  0.0),
    ("Bleu_4",  1.4),
    ("CIDEr",   1.17),
    ("METEOR",  2.0),
    ("ROUGE_L", 1.0),
];

fn weight_of(metric: &str) -> f64 {
    METRIC_WEIGHTS
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// Weighted sum of the named scores. Unknown metrics weigh zero.
pub fn weighted_score(scores: &Scores) -> f64 {
    scores
        .iter()
        .map(|(name, value)| value * weight_of(name))
        .sum()
}

// ─── BestScoreTracker ─────────────────────────────────────────────────────────
/// Remembers the best weighted score and the epoch that produced it.
#[derive(Debug, Clone)]
pub struct BestScoreTracker {
    best:  f64,
    epoch: Option<usize>,
}

impl BestScoreTracker {
    /// Starts from 0.0: a run whose validation score never rises above
    /// zero saves nothing.
    pub fn new() -> Self {
        Self { best: 0.0, epoch: None }
    }

    /// Record an epoch's score. Returns true iff it strictly beats the
    /// best seen so far, in which case it becomes the new best.
    pub fn observe(&mut self, epoch: usize, score: f64) -> bool {
        if score > self.best {
            self.best  = score;
            self.epoch = Some(epoch);
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.epoch
    }
}

impl Default for BestScoreTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> Scores {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_weighted_sum() {
        let s = scores(&[
            ("Bleu_1", 0.8), ("Bleu_2", 0.6), ("Bleu_3", 0.5), ("Bleu_4", 0.4),
            ("METEOR", 0.28), ("ROUGE_L", 0.6), ("CIDEr", 0.5),
        ]);
        let expected = 1.4 * 0.4 + 2.0 * 0.28 + 1.0 * 0.6 + 1.17 * 0.5;
        assert!((weighted_score(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_metric_ignored() {
        let s = scores(&[("SPICE", 10.0), ("ROUGE_L", 0.5)]);
        assert!((weighted_score(&s) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_strict_improvement_only() {
        let mut t = BestScoreTracker::new();
        assert!(t.observe(0, 1.0));
        assert!(!t.observe(1, 1.0));  // tie
        assert!(!t.observe(2, 0.9));
        assert!(t.observe(3, 1.2));
        assert_eq!(t.best_epoch(), Some(3));
        assert_eq!(t.best(), 1.2);
    }

    #[test]
    fn test_zero_score_never_saves() {
        let mut t = BestScoreTracker::new();
        assert!(!t.observe(0, 0.0));
        assert_eq!(t.best_epoch(), None);
    }

    #[test]
    fn test_saves_iff_greater_than_all_previous() {
        let history = [0.3, 0.5, 0.4, 0.5, 0.7, 0.1];
        let mut t = BestScoreTracker::new();
        let mut seen: Vec<f64> = Vec::new();
        for (epoch, &s) in history.iter().enumerate() {
            let expected = seen.iter().all(|&p| s > p) && s > 0.0;
            assert_eq!(t.observe(epoch, s), expected, "epoch {epoch}");
            seen.push(s);
        }
    }
}

// ============================================================
// Layer 3 — Score Merging
// ============================================================
// Runs every scorer over the same (references, hypotheses) pair
// and flattens the results into one name → value map:
//
//   Bleu(4)  → Bleu_1, Bleu_2, Bleu_3, Bleu_4
//   Meteor   → METEOR
//   Rouge    → ROUGE_L
//   Cider    → CIDEr

use anyhow::{bail, ensure, Result};

use crate::domain::traits::{CaptionScorer, Hypotheses, MetricScore, References, Scores};

/// Metric names of the standard four scorers, in scorer order.
pub fn standard_metrics() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("bleu",   vec!["Bleu_1", "Bleu_2", "Bleu_3", "Bleu_4"]),
        ("meteor", vec!["METEOR"]),
        ("rouge",  vec!["ROUGE_L"]),
        ("cider",  vec!["CIDEr"]),
    ]
}

/// Score `hypo` against `refs` with every scorer and merge the results.
pub fn score_captions(
    scorers: &[Box<dyn CaptionScorer>],
    refs:    &References,
    hypo:    &Hypotheses,
) -> Result<Scores> {
    ensure!(
        refs.keys().eq(hypo.keys()),
        "references and hypotheses cover different video ids ({} vs {})",
        refs.len(),
        hypo.len()
    );

    let mut final_scores = Scores::new();
    for scorer in scorers {
        let names = scorer.metric_names();
        match scorer.compute_score(refs, hypo)? {
            MetricScore::Single(value) => {
                ensure!(names.len() == 1, "single score but {} metric names", names.len());
                final_scores.insert(names[0].clone(), value);
            }
            MetricScore::Multi(values) => {
                if values.len() != names.len() {
                    bail!(
                        "scorer returned {} values for metrics {:?}",
                        values.len(),
                        names
                    );
                }
                for (name, value) in names.iter().zip(values) {
                    final_scores.insert(name.clone(), value);
                }
            }
        }
    }

    tracing::debug!("Merged {} metric values", final_scores.len());
    Ok(final_scores)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        names: Vec<String>,
        score: MetricScore,
    }

    impl CaptionScorer for Fixed {
        fn metric_names(&self) -> &[String] {
            &self.names
        }

        fn compute_score(&self, _: &References, _: &Hypotheses) -> Result<MetricScore> {
            Ok(self.score.clone())
        }
    }

    fn fixed(names: &[&str], score: MetricScore) -> Box<dyn CaptionScorer> {
        Box::new(Fixed {
            names: names.iter().map(|s| s.to_string()).collect(),
            score,
        })
    }

    fn sample_io() -> (References, Hypotheses) {
        let mut refs = References::new();
        let mut hypo = Hypotheses::new();
        refs.insert(6513, vec!["a man is singing".into(), "someone sings".into()]);
        hypo.insert(6513, vec!["a man sings".into()]);
        (refs, hypo)
    }

    #[test]
    fn test_merges_single_and_multi() {
        let (refs, hypo) = sample_io();
        let scorers = vec![
            fixed(&["Bleu_1", "Bleu_2", "Bleu_3", "Bleu_4"], MetricScore::Multi(vec![0.8, 0.6, 0.5, 0.4])),
            fixed(&["METEOR"],  MetricScore::Single(0.27)),
            fixed(&["ROUGE_L"], MetricScore::Single(0.59)),
            fixed(&["CIDEr"],   MetricScore::Single(0.45)),
        ];
        let scores = score_captions(&scorers, &refs, &hypo).unwrap();
        assert_eq!(scores.len(), 7);
        assert_eq!(scores["Bleu_4"], 0.4);
        assert_eq!(scores["CIDEr"], 0.45);
    }

    #[test]
    fn test_multi_length_mismatch_is_error() {
        let (refs, hypo) = sample_io();
        let scorers = vec![fixed(&["Bleu_1", "Bleu_2"], MetricScore::Multi(vec![0.1]))];
        assert!(score_captions(&scorers, &refs, &hypo).is_err());
    }

    #[test]
    fn test_mismatched_ids_is_error() {
        let (refs, mut hypo) = sample_io();
        hypo.insert(6514, vec!["extra".into()]);
        let scorers = vec![fixed(&["METEOR"], MetricScore::Single(0.2))];
        assert!(score_captions(&scorers, &refs, &hypo).is_err());
    }

    #[test]
    fn test_standard_metrics_cover_weights() {
        let names: Vec<&str> = standard_metrics().into_iter().flat_map(|(_, n)| n).collect();
        for (metric, _) in crate::domain::checkpoint_policy::METRIC_WEIGHTS {
            assert!(names.contains(&metric), "{metric} missing");
        }
    }
}

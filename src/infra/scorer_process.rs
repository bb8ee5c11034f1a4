// ============================================================
// Layer 6 — External Scorer Process
// ============================================================
// BLEU, METEOR, ROUGE-L and CIDEr come from an external caption
// evaluation toolkit. Each metric is one invocation of a scorer
// command:
//
//   <program> <args...> <metric>        metric ∈ bleu|meteor|rouge|cider
//
//   stdin : {"metric": "bleu",
//            "refs": {"6513": ["a man ...", ...], ...},
//            "hypo": {"6513": ["a man sings"], ...}}
//   stdout: {"score": 0.41}   or   {"score": [0.8, 0.6, 0.5, 0.4]}
//
// A non-zero exit status or unparsable output is an error; the
// scorer's stderr is passed through to ours. The request is written
// concurrently with reading the reply, so the scorer may stream
// output before it has consumed its input.
//
// Reference: Rust std::process documentation

use std::{
    io::Write,
    process::{Command, Stdio},
    thread,
};

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::scoring::standard_metrics;
use crate::domain::traits::{CaptionScorer, Hypotheses, MetricScore, References};

#[derive(Serialize)]
struct ScoreRequest<'a> {
    metric: &'a str,
    refs:   &'a References,
    hypo:   &'a Hypotheses,
}

#[derive(Deserialize)]
struct ScoreResponse {
    score: RawScore,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Single(f64),
    Multi(Vec<f64>),
}

/// One metric computed by an external command.
#[derive(Debug, Clone)]
pub struct ExternalScorer {
    program: String,
    args:    Vec<String>,
    metric:  String,
    names:   Vec<String>,
}

impl ExternalScorer {
    pub fn new(program: impl Into<String>, args: Vec<String>, metric: &str, names: &[&str]) -> Self {
        Self {
            program: program.into(),
            args,
            metric:  metric.to_string(),
            names:   names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// The four standard scorers sharing one whitespace-separated
    /// command line, e.g. `"python3 tools/score.py"`.
    pub fn standard_set(command: &str) -> Result<Vec<Box<dyn CaptionScorer>>> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("scorer command is empty");
        };
        let args: Vec<String> = parts.collect();

        Ok(standard_metrics()
            .into_iter()
            .map(|(metric, names)| {
                Box::new(ExternalScorer::new(program.clone(), args.clone(), metric, &names))
                    as Box<dyn CaptionScorer>
            })
            .collect())
    }
}

impl CaptionScorer for ExternalScorer {
    fn metric_names(&self) -> &[String] {
        &self.names
    }

    fn compute_score(&self, refs: &References, hypo: &Hypotheses) -> Result<MetricScore> {
        let request = serde_json::to_vec(&ScoreRequest { metric: &self.metric, refs, hypo })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.metric)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Cannot start scorer '{}'", self.program))?;

        // Feed stdin from a scoped thread while this one drains stdout,
        // so a scorer that writes before reading everything cannot stall
        // on a full pipe.
        let mut stdin = child.stdin.take().context("scorer stdin unavailable")?;
        let (written, output) = thread::scope(|s| {
            let writer = s.spawn(move || stdin.write_all(&request));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.with_context(|| format!("{} scorer did not finish", self.metric))?;
        ensure!(
            output.status.success(),
            "{} scorer exited with {}",
            self.metric,
            output.status
        );
        match written {
            Ok(result) => result
                .with_context(|| format!("Cannot send captions to {} scorer", self.metric))?,
            Err(_) => bail!("{} scorer input thread panicked", self.metric),
        }

        let response: ScoreResponse = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("{} scorer returned malformed output", self.metric))?;

        tracing::debug!("{} scorer finished", self.metric);
        Ok(match response.score {
            RawScore::Single(v) => MetricScore::Single(v),
            RawScore::Multi(v)  => MetricScore::Multi(v),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn io() -> (References, Hypotheses) {
        let mut refs = References::new();
        let mut hypo = Hypotheses::new();
        refs.insert(7010, vec!["a woman is talking".into()]);
        hypo.insert(7010, vec!["a woman talks".into()]);
        (refs, hypo)
    }

    fn shell(script: &str, metric: &str, names: &[&str]) -> ExternalScorer {
        ExternalScorer::new(
            "sh",
            vec!["-c".into(), script.into(), "scorer".into()],
            metric,
            names,
        )
    }

    #[test]
    fn test_multi_valued_response() {
        let (refs, hypo) = io();
        let s = shell(
            r#"cat > /dev/null; echo '{"score": [0.8, 0.6, 0.5, 0.4]}'"#,
            "bleu",
            &["Bleu_1", "Bleu_2", "Bleu_3", "Bleu_4"],
        );
        assert_eq!(
            s.compute_score(&refs, &hypo).unwrap(),
            MetricScore::Multi(vec![0.8, 0.6, 0.5, 0.4])
        );
    }

    #[test]
    fn test_metric_passed_as_last_argument() {
        let (refs, hypo) = io();
        let s = shell(
            r#"cat > /dev/null; if [ "$1" = "cider" ]; then echo '{"score": 0.5}'; else exit 3; fi"#,
            "cider",
            &["CIDEr"],
        );
        assert_eq!(s.compute_score(&refs, &hypo).unwrap(), MetricScore::Single(0.5));
    }

    #[test]
    fn test_request_carries_captions() {
        let (refs, hypo) = io();
        let s = shell(
            r#"grep -q '"7010":\["a woman talks"\]' && echo '{"score": 1.0}' || exit 1"#,
            "meteor",
            &["METEOR"],
        );
        assert_eq!(s.compute_score(&refs, &hypo).unwrap(), MetricScore::Single(1.0));
    }

    #[test]
    fn test_failure_exit_is_error() {
        let (refs, hypo) = io();
        let s = shell("cat > /dev/null; exit 2", "rouge", &["ROUGE_L"]);
        assert!(s.compute_score(&refs, &hypo).is_err());
    }

    #[test]
    fn test_malformed_output_is_error() {
        let (refs, hypo) = io();
        let s = shell("cat > /dev/null; echo not-json", "rouge", &["ROUGE_L"]);
        assert!(s.compute_score(&refs, &hypo).is_err());
    }

    #[test]
    fn test_large_output_before_reading_input() {
        // Both payloads exceed a pipe buffer: the scorer blocks on stdout
        // until its reply is drained, and only then reads the request.
        let mut refs = References::new();
        let mut hypo = Hypotheses::new();
        for vid in 7010..10000 {
            refs.insert(vid, vec!["a person is cooking something in a big kitchen pan".repeat(2)]);
            hypo.insert(vid, vec!["a man is cooking".into()]);
        }
        let s = shell(
            r#"head -c 300000 /dev/zero | tr '\0' ' '; cat > /dev/null; echo '{"score": 0.5}'"#,
            "cider",
            &["CIDEr"],
        );
        assert_eq!(s.compute_score(&refs, &hypo).unwrap(), MetricScore::Single(0.5));
    }

    #[test]
    fn test_standard_set() {
        let scorers = ExternalScorer::standard_set("python3 score.py --quiet").unwrap();
        assert_eq!(scorers.len(), 4);
        assert_eq!(scorers[0].metric_names().len(), 4);
        assert!(ExternalScorer::standard_set("   ").is_err());
    }
}

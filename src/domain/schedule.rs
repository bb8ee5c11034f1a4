// ============================================================
// Layer 3 — Training Schedules
// ============================================================
// Two scalars change while training runs, and both are pure
// functions so they can be tested without a training loop:
//
//   sample_probability(epoch)  — scheduled sampling: how often the
//                                decoder is fed its own previous
//                                prediction instead of the ground
//                                truth word. Grows linearly:
//                                    p = epoch × rate   (rate 0.008)
//
//   LrSchedule::learning_rate  — staircase exponential decay over
//                                optimiser steps:
//                                    lr = lr0 × rate^floor(step / decay_steps)
//
// Reference: Bengio et al. (2015) Scheduled Sampling
//            Kingma & Ba (2015) Adam

use serde::{Deserialize, Serialize};

/// Scheduled-sampling probability for a 0-based epoch. Values above 1
/// simply mean "always feed the prediction".
pub fn sample_probability(epoch: usize, rate: f64) -> f64 {
    epoch as f64 * rate
}

/// Staircase exponential learning-rate decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LrSchedule {
    pub initial:     f64,
    pub decay_steps: usize,
    pub decay_rate:  f64,
}

impl LrSchedule {
    pub fn new(initial: f64, decay_steps: usize, decay_rate: f64) -> Self {
        Self { initial, decay_steps, decay_rate }
    }

    /// Learning rate for the given optimiser step (0-based).
    pub fn learning_rate(&self, step: usize) -> f64 {
        if self.decay_steps == 0 {
            return self.initial;
        }
        let stairs = (step / self.decay_steps) as i32;
        self.initial * self.decay_rate.powi(stairs)
    }
}

impl Default for LrSchedule {
    fn default() -> Self {
        Self::new(0.0004, 20350, 0.316)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_probability_is_linear() {
        assert_eq!(sample_probability(0, 0.008), 0.0);
        assert!((sample_probability(10, 0.008) - 0.08).abs() < 1e-12);
        assert!((sample_probability(49, 0.008) - 0.392).abs() < 1e-12);
    }

    #[test]
    fn test_sample_probability_not_clamped() {
        assert!((sample_probability(200, 0.008) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_lr_constant_within_a_stair() {
        let s = LrSchedule::default();
        assert_eq!(s.learning_rate(0), 0.0004);
        assert_eq!(s.learning_rate(20349), 0.0004);
    }

    #[test]
    fn test_lr_drops_at_stair_boundary() {
        let s = LrSchedule::default();
        assert!((s.learning_rate(20350) - 0.0004 * 0.316).abs() < 1e-15);
        assert!((s.learning_rate(2 * 20350 + 7) - 0.0004 * 0.316 * 0.316).abs() < 1e-15);
    }

    #[test]
    fn test_zero_decay_steps_means_no_decay() {
        let s = LrSchedule::new(0.1, 0, 0.5);
        assert_eq!(s.learning_rate(1_000_000), 0.1);
    }
}

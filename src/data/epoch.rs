// ============================================================
// Layer 4 — Epoch Plan
// ============================================================
// Decides which training captions go into which mini-batch.
//
// Once per epoch:
//   1. Shuffle all training indices 0..train_size
//   2. Cut the shuffled list into contiguous chunks of batch_size
//   3. Keep the undersized remainder as one final chunk
//
// Example: train_size = 10, batch_size = 4
//   shuffled: [7 2 9 0 4 1 8 3 6 5]
//   batches:  [7 2 9 0] [4 1 8 3] [6 5]
//
// Every index therefore appears exactly once per epoch.
//
// The RNG is seeded once for the whole run and reused across
// epochs, so a run is reproducible but every epoch gets a
// different order.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: Rust Book §8 (Slices)
//            rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Owns the RNG that orders training examples.
pub struct EpochPlanner {
    rng:        StdRng,
    train_size: usize,
    batch_size: usize,
}

impl EpochPlanner {
    /// # Panics
    /// Panics if `batch_size` is zero.
    pub fn new(train_size: usize, batch_size: usize, seed: u64) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            rng: StdRng::seed_from_u64(seed),
            train_size,
            batch_size,
        }
    }

    /// Fresh shuffled order for the next epoch.
    pub fn next_epoch(&mut self) -> EpochPlan {
        let mut order: Vec<usize> = (0..self.train_size).collect();
        order.shuffle(&mut self.rng);

        tracing::debug!(
            "Epoch plan: {} examples, {} full batches, remainder {}",
            self.train_size,
            self.train_size / self.batch_size,
            self.train_size % self.batch_size,
        );

        EpochPlan { order, batch_size: self.batch_size }
    }
}

/// One epoch's shuffled order.
#[derive(Debug, Clone)]
pub struct EpochPlan {
    order:      Vec<usize>,
    batch_size: usize,
}

impl EpochPlan {
    /// Contiguous chunks of the shuffled order; the last one may be short.
    pub fn batches(&self) -> std::slice::Chunks<'_, usize> {
        self.order.chunks(self.batch_size)
    }

    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    /// The shuffled order itself.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_every_index_once() {
        let mut planner = EpochPlanner::new(130, 16, 123);
        for _ in 0..3 {
            let plan = planner.next_epoch();
            let mut seen: Vec<usize> = plan.batches().flatten().copied().collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..130).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_remainder_chunk() {
        let mut planner = EpochPlanner::new(10, 4, 1);
        let plan  = planner.next_epoch();
        let sizes: Vec<usize> = plan.batches().map(<[usize]>::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(plan.num_batches(), 3);
    }

    #[test]
    fn test_exact_multiple_has_no_remainder() {
        let mut planner = EpochPlanner::new(12, 4, 1);
        let sizes: Vec<usize> = planner.next_epoch().batches().map(<[usize]>::len).collect();
        assert_eq!(sizes, vec![4, 4, 4]);
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = EpochPlanner::new(50, 8, 123).next_epoch();
        let b = EpochPlanner::new(50, 8, 123).next_epoch();
        assert_eq!(a.order(), b.order());
    }

    #[test]
    fn test_epochs_reshuffle() {
        let mut planner = EpochPlanner::new(50, 8, 123);
        let first  = planner.next_epoch();
        let second = planner.next_epoch();
        assert_ne!(first.order(), second.order());
    }

    #[test]
    fn test_empty_training_set() {
        let mut planner = EpochPlanner::new(0, 8, 0);
        assert_eq!(planner.next_epoch().batches().count(), 0);
    }
}
